#[cfg(test)]
mod integration_tests {
    use crate::mailer::{MailError, Mailer};
    use crate::router::create_router;
    use crate::test_utils::test_utils::{
        admin_token, bearer, create_staff, init_test_tracing, login, setup_test_app,
        setup_test_app_state, setup_test_server, ADMIN_EMAIL, ADMIN_PASSWORD,
    };
    use async_trait::async_trait;
    use std::sync::Arc;
    use axum::http::{header, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use model::entities::user;
    use rust_decimal::Decimal;
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
    use serde_json::{json, Value};

    fn dec(value: &Value) -> Decimal {
        match value {
            Value::String(s) => s.parse().expect("decimal string"),
            Value::Number(n) => n.to_string().parse().expect("decimal number"),
            other => panic!("Expected a decimal, got {}", other),
        }
    }

    async fn post(server: &TestServer, token: &str, path: &str, body: Value) -> Value {
        let (name, value) = bearer(token);
        let response = server.post(path).add_header(name, value).json(&body).await;
        if !response.status_code().is_success() {
            panic!("POST {} failed with {}: {}", path, response.status_code(), response.text());
        }
        response.json::<Value>()["data"].clone()
    }

    async fn get(server: &TestServer, token: &str, path: &str) -> Value {
        let (name, value) = bearer(token);
        let response = server.get(path).add_header(name, value).await;
        response.assert_status(StatusCode::OK);
        response.json::<Value>()["data"].clone()
    }

    /// Faculty and department with the given per-semester price.
    async fn seed_department(server: &TestServer, token: &str, code: &str, price: &str, total_semesters: i32) -> (i64, i64) {
        let faculty = post(
            server,
            token,
            "/api/faculties",
            json!({ "name": format!("Faculty of {}", code), "code": code }),
        )
        .await;
        let faculty_id = faculty["id"].as_i64().unwrap();

        let department = post(
            server,
            token,
            "/api/departments",
            json!({
                "faculty_id": faculty_id,
                "name": format!("Department of {}", code),
                "code": code,
                "price": price,
                "total_semesters": total_semesters,
            }),
        )
        .await;
        (faculty_id, department["id"].as_i64().unwrap())
    }

    async fn enroll(server: &TestServer, token: &str, placement: (i64, i64), email: &str, semester: &str) -> Value {
        post(
            server,
            token,
            "/api/students",
            json!({
                "first_name": "Test",
                "last_name": email,
                "email": email,
                "faculty_id": placement.0,
                "department_id": placement.1,
                "semester": semester,
                "academic_year": "2025-2026",
                "session": "Spring",
            }),
        )
        .await
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn test_login_and_me() {
        let _guard = init_test_tracing();
        let (server, _) = setup_test_server().await;

        let token = admin_token(&server).await;
        let me = get(&server, &token, "/api/auth/me").await;
        assert_eq!(me["email"], ADMIN_EMAIL);
        assert_eq!(me["role"], "admin");
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_is_unauthorized() {
        let (server, _) = setup_test_server().await;

        let response = server
            .post("/api/auth/login")
            .json(&json!({ "email": ADMIN_EMAIL, "password": "not-the-password" }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let (server, _) = setup_test_server().await;

        let response = server.get("/api/students").await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .get("/api/students")
            .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer garbage"))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_viewer_cannot_write() {
        let (server, _) = setup_test_server().await;
        let admin = admin_token(&server).await;
        let viewer = create_staff(&server, &admin, "viewer@ums.test", "viewer").await;

        let (name, value) = bearer(&viewer);
        let response = server
            .post("/api/faculties")
            .add_header(name, value)
            .json(&json!({ "name": "Science", "code": "SCI" }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(response.json::<Value>()["code"], "FORBIDDEN");

        // Reads stay open to every role
        let faculties = get(&server, &viewer, "/api/faculties").await;
        assert!(faculties.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_accountant_cannot_enroll_but_can_record_payments() {
        let (server, _) = setup_test_server().await;
        let admin = admin_token(&server).await;
        let accountant = create_staff(&server, &admin, "money@ums.test", "accountant").await;
        let placement = seed_department(&server, &admin, "ACC", "500.00", 8).await;

        let (name, value) = bearer(&accountant);
        let response = server
            .post("/api/students")
            .add_header(name, value)
            .json(&json!({
                "first_name": "No",
                "last_name": "Access",
                "email": "no.access@ums.test",
                "faculty_id": placement.0,
                "department_id": placement.1,
                "academic_year": "2025-2026",
                "session": "Spring",
            }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let enrollment = enroll(&server, &admin, placement, "paying@ums.test", "1").await;
        let recorded = post(
            &server,
            &accountant,
            "/api/payments",
            json!({
                "student_id": enrollment["student"]["id"],
                "amount": "100.00",
                "payment_type": "tuition",
                "method": "cash",
            }),
        )
        .await;
        assert_eq!(dec(&recorded["payment"]["amount"]), Decimal::new(100, 0));
    }

    #[tokio::test]
    async fn test_faculty_department_course_crud() {
        let (server, _) = setup_test_server().await;
        let token = admin_token(&server).await;
        let (faculty_id, department_id) = seed_department(&server, &token, "cse", "1200.00", 8).await;

        let faculty = get(&server, &token, &format!("/api/faculties/{}", faculty_id)).await;
        assert_eq!(faculty["code"], "CSE");

        let department = get(&server, &token, &format!("/api/departments/{}", department_id)).await;
        assert_eq!(dec(&department["price"]), Decimal::new(1200, 0));
        assert_eq!(department["total_semesters"], 8);

        let course = post(
            &server,
            &token,
            "/api/courses",
            json!({
                "department_id": department_id,
                "code": "CSE101",
                "title": "Programming Basics",
                "credits": 3,
                "semester": 1,
            }),
        )
        .await;
        let course_id = course["id"].as_i64().unwrap();

        let (name, value) = bearer(&token);
        let response = server
            .put(&format!("/api/courses/{}", course_id))
            .add_header(name, value)
            .json(&json!({ "title": "Programming Fundamentals" }))
            .await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<Value>()["data"]["title"], "Programming Fundamentals");

        let courses = get(
            &server,
            &token,
            &format!("/api/courses?department_id={}&semester=1", department_id),
        )
        .await;
        assert_eq!(courses.as_array().unwrap().len(), 1);

        // A faculty with departments cannot go
        let (name, value) = bearer(&token);
        let response = server
            .delete(&format!("/api/faculties/{}", faculty_id))
            .add_header(name, value)
            .await;
        response.assert_status(StatusCode::CONFLICT);

        let (name, value) = bearer(&token);
        server
            .delete(&format!("/api/courses/{}", course_id))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::OK);

        let (name, value) = bearer(&token);
        server
            .get(&format!("/api/courses/{}", course_id))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_department_with_unknown_faculty_is_rejected() {
        let (server, _) = setup_test_server().await;
        let token = admin_token(&server).await;

        let (name, value) = bearer(&token);
        let response = server
            .post("/api/departments")
            .add_header(name, value)
            .json(&json!({ "faculty_id": 999, "name": "Ghost", "code": "GHO", "price": "10.00" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_direct_enrollment_opens_first_ledger_row() {
        let (server, _) = setup_test_server().await;
        let token = admin_token(&server).await;
        let placement = seed_department(&server, &token, "EEE", "750.00", 8).await;

        let enrollment = enroll(&server, &token, placement, "Ada@Ums.Test", "1").await;
        let student = &enrollment["student"];
        let account = &enrollment["account"];

        assert!(student["student_id"].as_str().unwrap().starts_with("EEE-2025-"));
        assert_eq!(student["email"], "ada@ums.test");
        assert_eq!(student["semester"], "1");
        assert_eq!(dec(&account["tuition_fee"]), Decimal::new(750, 0));
        assert_eq!(dec(&account["total_due"]), Decimal::new(750, 0));
        assert_eq!(account["status"], "pending");
        assert_eq!(account["balance_status"], "unpaid");

        // Same email again
        let (name, value) = bearer(&token);
        let response = server
            .post("/api/students")
            .add_header(name, value)
            .json(&json!({
                "first_name": "Ada",
                "last_name": "Again",
                "email": "ada@ums.test",
                "faculty_id": placement.0,
                "department_id": placement.1,
                "academic_year": "2025-2026",
                "session": "Spring",
            }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_application_approval_flow() {
        let (server, _) = setup_test_server().await;
        let token = admin_token(&server).await;
        let placement = seed_department(&server, &token, "BBA", "900.00", 8).await;

        let application = post(
            &server,
            &token,
            "/api/applications",
            json!({
                "first_name": "Grace",
                "last_name": "Hopper",
                "email": "grace@ums.test",
                "faculty_id": placement.0,
                "department_id": placement.1,
                "academic_year": "2025-2026",
                "session": "Fall",
            }),
        )
        .await;
        assert_eq!(application["status"], "pending");
        let approve_path = format!("/api/applications/{}/approve", application["id"]);

        let admission = post(&server, &token, &approve_path, json!({})).await;
        assert_eq!(admission["application"]["status"], "approved");
        assert_eq!(admission["application"]["student_id"], admission["student"]["id"]);
        assert_eq!(admission["student"]["semester"], "1");
        assert_eq!(dec(&admission["account"]["total_due"]), Decimal::new(900, 0));

        // Approving twice is a conflict
        let (name, value) = bearer(&token);
        let response = server.post(&approve_path).add_header(name, value).json(&json!({})).await;
        response.assert_status(StatusCode::CONFLICT);

        let pending = get(&server, &token, "/api/applications?status=pending").await;
        assert!(pending.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_application_rejection() {
        let (server, _) = setup_test_server().await;
        let token = admin_token(&server).await;
        let placement = seed_department(&server, &token, "LAW", "800.00", 8).await;

        let application = post(
            &server,
            &token,
            "/api/applications",
            json!({
                "first_name": "Alan",
                "last_name": "Turing",
                "email": "alan@ums.test",
                "faculty_id": placement.0,
                "department_id": placement.1,
                "academic_year": "2025-2026",
                "session": "Fall",
            }),
        )
        .await;

        let rejected = post(
            &server,
            &token,
            &format!("/api/applications/{}/reject", application["id"]),
            json!({ "remarks": "Incomplete documents" }),
        )
        .await;
        assert_eq!(rejected["status"], "rejected");
        assert_eq!(rejected["remarks"], "Incomplete documents");

        let students = get(&server, &token, "/api/students").await;
        assert!(students.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_payments_move_the_balance() {
        let (server, _) = setup_test_server().await;
        let token = admin_token(&server).await;
        let placement = seed_department(&server, &token, "ARC", "500.00", 8).await;
        let partial = enroll(&server, &token, placement, "partial@ums.test", "1").await;
        let unpaid = enroll(&server, &token, placement, "unpaid@ums.test", "1").await;
        let student_id = partial["student"]["id"].as_i64().unwrap();

        let recorded = post(
            &server,
            &token,
            "/api/payments",
            json!({
                "student_id": student_id,
                "amount": "200.00",
                "payment_type": "tuition",
                "method": "bankTransfer",
                "reference": "TX-1",
            }),
        )
        .await;
        assert_eq!(dec(&recorded["account"]["paid_amount"]), Decimal::new(200, 0));
        assert_eq!(recorded["account"]["status"], "partial");

        // Non-tuition payments leave the ledger alone
        let fee = post(
            &server,
            &token,
            "/api/payments",
            json!({
                "student_id": student_id,
                "amount": "25.00",
                "payment_type": "exam",
                "method": "cash",
            }),
        )
        .await;
        assert!(fee["account"].is_null());

        let balance = get(&server, &token, &format!("/api/students/{}/balance", student_id)).await;
        assert_eq!(dec(&balance["breakdown"]["balance"]), Decimal::new(300, 0));
        assert_eq!(balance["breakdown"]["status"], "partial");

        let filtered = get(&server, &token, "/api/students?payment_status=partial").await;
        let filtered = filtered.as_array().unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0]["id"], student_id);

        let filtered = get(&server, &token, "/api/students?payment_status=unpaid").await;
        assert_eq!(filtered.as_array().unwrap()[0]["id"], unpaid["student"]["id"]);

        let (name, value) = bearer(&token);
        server
            .get("/api/students?payment_status=overdue")
            .add_header(name, value)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let history = get(&server, &token, &format!("/api/students/{}/payments", student_id)).await;
        assert_eq!(history.as_array().unwrap().len(), 2);

        // Reversing the tuition payment restores the balance
        let (name, value) = bearer(&token);
        server
            .delete(&format!("/api/payments/{}", recorded["payment"]["id"]))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::OK);

        let balance = get(&server, &token, &format!("/api/students/{}/balance", student_id)).await;
        assert_eq!(dec(&balance["breakdown"]["balance"]), Decimal::new(500, 0));
        assert_eq!(balance["breakdown"]["status"], "unpaid");
    }

    #[tokio::test]
    async fn test_non_positive_payment_is_rejected() {
        let (server, _) = setup_test_server().await;
        let token = admin_token(&server).await;
        let placement = seed_department(&server, &token, "MTH", "500.00", 8).await;
        let enrollment = enroll(&server, &token, placement, "zero@ums.test", "1").await;

        let (name, value) = bearer(&token);
        let response = server
            .post("/api/payments")
            .add_header(name, value)
            .json(&json!({
                "student_id": enrollment["student"]["id"],
                "amount": "0",
                "payment_type": "tuition",
                "method": "cash",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_account_adjustment_applies_scholarship() {
        let (server, _) = setup_test_server().await;
        let token = admin_token(&server).await;
        let placement = seed_department(&server, &token, "PHY", "500.00", 8).await;
        let enrollment = enroll(&server, &token, placement, "scholar@ums.test", "1").await;
        let account_id = enrollment["account"]["id"].as_i64().unwrap();

        let (name, value) = bearer(&token);
        let response = server
            .put(&format!("/api/student-accounts/{}", account_id))
            .add_header(name, value)
            .json(&json!({ "discount": "100", "scholarship": "10", "paid_type": "waiver" }))
            .await;
        response.assert_status(StatusCode::OK);
        let account = response.json::<Value>()["data"].clone();

        // 500 - 100 discount - 50 scholarship
        assert_eq!(dec(&account["balance"]), Decimal::new(350, 0));
        assert_eq!(account["paid_type"], "waiver");

        let (name, value) = bearer(&token);
        let response = server
            .put(&format!("/api/student-accounts/{}", account_id))
            .add_header(name, value)
            .json(&json!({ "scholarship": "150" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_semester_end_event_promotes_students() {
        let _guard = init_test_tracing();
        let (server, _) = setup_test_server().await;
        let token = admin_token(&server).await;
        let placement = seed_department(&server, &token, "CIV", "500.00", 8).await;
        let first = enroll(&server, &token, placement, "first@ums.test", "3").await;
        let second = enroll(&server, &token, placement, "second@ums.test", "3").await;
        let finalist = enroll(&server, &token, placement, "finalist@ums.test", "8").await;

        let created = post(
            &server,
            &token,
            "/api/academic-calendar",
            json!({
                "title": "End of semester 3",
                "eventType": "semesterEnd",
                "startDate": "2025-06-01",
                "endDate": "2025-06-01",
                "semester": "3",
                "academicYear": "2025-2026",
                "affectedDepartments": [placement.1],
            }),
        )
        .await;

        let rollover = &created["rollover"];
        assert_eq!(rollover["processed"], 2);
        assert_eq!(rollover["promoted"], 2);
        assert_eq!(rollover["graduated"], 0);
        assert_eq!(rollover["accounts_created"], 2);
        assert_eq!(created["event"]["affected_departments"], json!([placement.1]));

        for enrolled in [&first, &second] {
            let id = enrolled["student"]["id"].as_i64().unwrap();
            let student = get(&server, &token, &format!("/api/students/{}", id)).await;
            assert_eq!(student["semester"], "4");

            let accounts = get(&server, &token, &format!("/api/students/{}/accounts", id)).await;
            let opened: Vec<&Value> = accounts
                .as_array()
                .unwrap()
                .iter()
                .filter(|a| a["semester"] == "4")
                .collect();
            assert_eq!(opened.len(), 1);
            assert_eq!(dec(&opened[0]["tuition_fee"]), Decimal::new(500, 0));
            assert_eq!(dec(&opened[0]["total_due"]), Decimal::new(500, 0));
            assert_eq!(opened[0]["status"], "pending");
        }

        // Semester 8 students are only touched by the semester 8 event
        let finalist_id = finalist["student"]["id"].as_i64().unwrap();
        let untouched = get(&server, &token, &format!("/api/students/{}", finalist_id)).await;
        assert_eq!(untouched["semester"], "8");

        let graduation = post(
            &server,
            &token,
            "/api/academic-calendar",
            json!({
                "title": "End of semester 8",
                "event_type": "semesterEnd",
                "start_date": "2025-06-02",
                "end_date": "2025-06-02",
                "semester": "8",
                "academic_year": "2025-2026",
                "affected_departments": [placement.1],
            }),
        )
        .await;
        assert_eq!(graduation["rollover"]["graduated"], 1);
        assert_eq!(graduation["rollover"]["accounts_created"], 0);

        let graduate = get(&server, &token, &format!("/api/students/{}", finalist_id)).await;
        assert_eq!(graduate["semester"], "Graduated");
        assert_eq!(graduate["is_active"], false);
        let accounts = get(&server, &token, &format!("/api/students/{}/accounts", finalist_id)).await;
        assert_eq!(accounts.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rollover_skips_existing_accounts() {
        let (server, _) = setup_test_server().await;
        let token = admin_token(&server).await;
        let placement = seed_department(&server, &token, "BIO", "500.00", 8).await;
        let student = enroll(&server, &token, placement, "repeat@ums.test", "3").await;
        let id = student["student"]["id"].as_i64().unwrap();

        let event = json!({
            "title": "End of semester 3",
            "event_type": "semesterEnd",
            "start_date": "2025-06-01",
            "end_date": "2025-06-01",
            "semester": "3",
            "academic_year": "2025-2026",
            "affected_departments": [placement.1],
        });
        post(&server, &token, "/api/academic-calendar", event.clone()).await;

        // Put the student back a semester, then replay the same event
        let (name, value) = bearer(&token);
        server
            .put(&format!("/api/students/{}", id))
            .add_header(name, value)
            .json(&json!({ "semester": "3" }))
            .await
            .assert_status(StatusCode::OK);

        let replay = post(&server, &token, "/api/academic-calendar", event).await;
        assert_eq!(replay["rollover"]["promoted"], 1);
        assert_eq!(replay["rollover"]["accounts_created"], 0);
        assert_eq!(replay["rollover"]["skipped_existing_accounts"], 1);

        let accounts = get(&server, &token, &format!("/api/students/{}/accounts", id)).await;
        let semester_four = accounts
            .as_array()
            .unwrap()
            .iter()
            .filter(|a| a["semester"] == "4")
            .count();
        assert_eq!(semester_four, 1);
    }

    #[tokio::test]
    async fn test_activating_semester_end_on_update_runs_rollover_once() {
        let (server, _) = setup_test_server().await;
        let token = admin_token(&server).await;
        let placement = seed_department(&server, &token, "CHE", "500.00", 8).await;
        let student = enroll(&server, &token, placement, "later@ums.test", "2").await;
        let id = student["student"]["id"].as_i64().unwrap();

        let mut event = json!({
            "title": "End of semester 2",
            "event_type": "semesterEnd",
            "start_date": "2025-01-10",
            "end_date": "2025-01-10",
            "semester": "2",
            "academic_year": "2025-2026",
            "is_active": false,
            "affected_departments": [placement.1],
        });
        let created = post(&server, &token, "/api/academic-calendar", event.clone()).await;
        assert!(created["rollover"].is_null());
        let path = format!("/api/academic-calendar/{}", created["event"]["id"]);

        event["is_active"] = json!(true);
        let (name, value) = bearer(&token);
        let response = server.put(&path).add_header(name, value).json(&event).await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<Value>()["data"]["rollover"]["promoted"], 1);

        let (name, value) = bearer(&token);
        let response = server.put(&path).add_header(name, value).json(&event).await;
        response.assert_status(StatusCode::OK);
        assert!(response.json::<Value>()["data"]["rollover"].is_null());

        let promoted = get(&server, &token, &format!("/api/students/{}", id)).await;
        assert_eq!(promoted["semester"], "3");
    }

    #[tokio::test]
    async fn test_holiday_does_not_roll_over() {
        let (server, _) = setup_test_server().await;
        let token = admin_token(&server).await;
        let placement = seed_department(&server, &token, "HIS", "500.00", 8).await;
        let student = enroll(&server, &token, placement, "holiday@ums.test", "1").await;

        let created = post(
            &server,
            &token,
            "/api/academic-calendar",
            json!({
                "title": "Spring break",
                "event_type": "holiday",
                "start_date": "2025-03-01",
                "end_date": "2025-03-07",
                "semester": "1",
                "academic_year": "2025-2026",
                "affected_departments": [placement.1],
            }),
        )
        .await;
        assert!(created["rollover"].is_null());

        let unchanged = get(&server, &token, &format!("/api/students/{}", student["student"]["id"])).await;
        assert_eq!(unchanged["semester"], "1");

        let events = get(&server, &token, "/api/academic-calendar?event_type=holiday").await;
        assert_eq!(events.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_calendar_event_validation() {
        let (server, _) = setup_test_server().await;
        let token = admin_token(&server).await;

        let (name, value) = bearer(&token);
        let response = server
            .post("/api/academic-calendar")
            .add_header(name, value)
            .json(&json!({
                "title": "Backwards",
                "event_type": "holiday",
                "start_date": "2025-03-07",
                "end_date": "2025-03-01",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let (name, value) = bearer(&token);
        let response = server
            .post("/api/academic-calendar")
            .add_header(name, value)
            .json(&json!({
                "title": "No semester",
                "event_type": "semesterEnd",
                "start_date": "2025-03-01",
                "end_date": "2025-03-01",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let (name, value) = bearer(&token);
        let response = server
            .post("/api/academic-calendar")
            .add_header(name, value)
            .json(&json!({
                "title": "Unknown department",
                "event_type": "semesterEnd",
                "start_date": "2025-03-01",
                "end_date": "2025-03-01",
                "semester": "1",
                "academic_year": "2025-2026",
                "affected_departments": [4242],
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let placement = seed_department(&server, &token, "GEO", "500.00", 8).await;
        let (name, value) = bearer(&token);
        let response = server
            .post("/api/academic-calendar")
            .add_header(name, value)
            .json(&json!({
                "title": "Last semester ever",
                "event_type": "semesterEnd",
                "start_date": "2025-03-01",
                "end_date": "2025-03-01",
                "semester": i32::MAX.to_string(),
                "academic_year": "2025-2026",
                "affected_departments": [placement.1],
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let events = get(&server, &token, "/api/academic-calendar").await;
        assert!(events.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_student_update_stores_canonical_semester() {
        let (server, _) = setup_test_server().await;
        let token = admin_token(&server).await;
        let placement = seed_department(&server, &token, "PHY", "500.00", 8).await;
        let enrolled = enroll(&server, &token, placement, "padded@ums.test", "1").await;
        let id = enrolled["student"]["id"].as_i64().unwrap();
        let path = format!("/api/students/{}", id);

        let (name, value) = bearer(&token);
        let response = server.put(&path).add_header(name, value).json(&json!({ "semester": " 03" })).await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<Value>()["data"]["semester"], "3");

        // Beyond the program length
        let (name, value) = bearer(&token);
        let response = server.put(&path).add_header(name, value).json(&json!({ "semester": "9" })).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let ended = post(
            &server,
            &token,
            "/api/academic-calendar",
            json!({
                "title": "End of semester 3",
                "event_type": "semesterEnd",
                "start_date": "2025-06-01",
                "end_date": "2025-06-01",
                "semester": "3",
                "academic_year": "2025-2026",
                "affected_departments": [placement.1],
            }),
        )
        .await;
        assert_eq!(ended["rollover"]["promoted"], 1);
        assert_eq!(get(&server, &token, &path).await["semester"], "4");
    }

    #[tokio::test]
    async fn test_graduated_student_is_never_active() {
        let (server, _) = setup_test_server().await;
        let token = admin_token(&server).await;
        let placement = seed_department(&server, &token, "MAT", "500.00", 8).await;
        let enrolled = enroll(&server, &token, placement, "alumnus@ums.test", "8").await;
        let path = format!("/api/students/{}", enrolled["student"]["id"].as_i64().unwrap());

        let (name, value) = bearer(&token);
        let response = server
            .put(&path)
            .add_header(name, value)
            .json(&json!({ "semester": "Graduated", "is_active": true }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let (name, value) = bearer(&token);
        let response = server.put(&path).add_header(name, value).json(&json!({ "semester": "Graduated" })).await;
        response.assert_status(StatusCode::OK);
        let graduate: Value = response.json::<Value>()["data"].clone();
        assert_eq!(graduate["semester"], "Graduated");
        assert_eq!(graduate["is_active"], false);

        let (name, value) = bearer(&token);
        let response = server.put(&path).add_header(name, value).json(&json!({ "is_active": true })).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_dashboard_stats_follow_writes() {
        let (server, _) = setup_test_server().await;
        let token = admin_token(&server).await;
        let placement = seed_department(&server, &token, "GEO", "400.00", 8).await;
        enroll(&server, &token, placement, "one@ums.test", "1").await;

        let stats = get(&server, &token, "/api/dashboard/stats").await;
        assert_eq!(stats["total_students"], 1);
        assert_eq!(dec(&stats["total_outstanding"]), Decimal::new(400, 0));

        enroll(&server, &token, placement, "two@ums.test", "1").await;
        let stats = get(&server, &token, "/api/dashboard/stats").await;
        assert_eq!(stats["total_students"], 2);
        assert_eq!(stats["active_students"], 2);
        assert_eq!(dec(&stats["total_billed"]), Decimal::new(800, 0));
    }

    #[tokio::test]
    async fn test_reports() {
        let (server, _) = setup_test_server().await;
        let token = admin_token(&server).await;
        let placement = seed_department(&server, &token, "ECO", "600.00", 8).await;
        let payer = enroll(&server, &token, placement, "payer@ums.test", "1").await;
        enroll(&server, &token, placement, "debtor@ums.test", "1").await;

        post(
            &server,
            &token,
            "/api/payments",
            json!({
                "student_id": payer["student"]["id"],
                "amount": "600.00",
                "payment_date": "2025-02-15",
                "payment_type": "tuition",
                "method": "card",
            }),
        )
        .await;

        let financial = get(&server, &token, "/api/reports/financial").await;
        assert_eq!(dec(&financial["total_billed"]), Decimal::new(1200, 0));
        assert_eq!(dec(&financial["total_collected"]), Decimal::new(600, 0));
        assert_eq!(dec(&financial["total_outstanding"]), Decimal::new(600, 0));

        let payments = get(&server, &token, "/api/reports/payments?from=2025-02-01&to=2025-02-28").await;
        assert_eq!(payments["payment_count"], 1);
        assert_eq!(payments["by_method"][0]["method"], "card");
        assert_eq!(payments["by_month"][0]["month"], "2025-02");

        let (name, value) = bearer(&token);
        server
            .get("/api/reports/payments?from=2025-03-01&to=2025-02-01")
            .add_header(name, value)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let dues = get(&server, &token, &format!("/api/reports/dues?department_id={}", placement.1)).await;
        let dues = dues.as_array().unwrap();
        assert_eq!(dues.len(), 1);
        assert_eq!(dues[0]["status"], "unpaid");

        let recent = get(&server, &token, "/api/dashboard/recent-payments?limit=5").await;
        assert_eq!(recent.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_exports() {
        let (server, _) = setup_test_server().await;
        let token = admin_token(&server).await;
        let placement = seed_department(&server, &token, "ART", "300.00", 8).await;
        enroll(&server, &token, placement, "painter@ums.test", "1").await;
        post(
            &server,
            &token,
            "/api/settings",
            json!({ "key": "university_name", "value": "Test University" }),
        )
        .await;

        let (name, value) = bearer(&token);
        let response = server.get("/api/export/students/pdf").add_header(name, value).await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.header(header::CONTENT_TYPE), "application/pdf");
        assert_eq!(
            response.header(header::CONTENT_DISPOSITION),
            "attachment; filename=\"students.pdf\""
        );
        assert!(response.as_bytes().starts_with(b"%PDF"));

        let (name, value) = bearer(&token);
        let response = server.get("/api/export/payments/excel").add_header(name, value).await;
        response.assert_status(StatusCode::OK);
        assert!(response.as_bytes().starts_with(b"PK"));

        let (name, value) = bearer(&token);
        server
            .get("/api/export/grades/pdf")
            .add_header(name, value)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let (name, value) = bearer(&token);
        server
            .get("/api/export/students/csv")
            .add_header(name, value)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let (server, state) = setup_test_server().await;

        server
            .post("/api/auth/forgot-password")
            .json(&json!({ "email": ADMIN_EMAIL }))
            .await
            .assert_status(StatusCode::OK);

        // Unknown addresses get the same answer
        server
            .post("/api/auth/forgot-password")
            .json(&json!({ "email": "nobody@ums.test" }))
            .await
            .assert_status(StatusCode::OK);

        let admin = user::Entity::find()
            .filter(user::Column::Email.eq(ADMIN_EMAIL))
            .one(&state.db)
            .await
            .unwrap()
            .unwrap();
        let token = admin.reset_token.expect("reset token issued");

        server
            .post("/api/auth/reset-password")
            .json(&json!({ "token": token, "new_password": "brand-new-password" }))
            .await
            .assert_status(StatusCode::OK);

        login(&server, ADMIN_EMAIL, "brand-new-password").await;
        server
            .post("/api/auth/login")
            .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        // Tokens are single use
        server
            .post("/api/auth/reset-password")
            .json(&json!({ "token": token, "new_password": "another-password" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    /// Relay that is always down.
    #[derive(Debug)]
    struct UnreachableMailer;

    #[async_trait]
    impl Mailer for UnreachableMailer {
        async fn send_password_reset(&self, to: &str, _name: &str, _reset_link: &str) -> Result<(), MailError> {
            Err(MailError::Delivery {
                to: to.to_string(),
                reason: "connection refused".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_reset_mail_failure_is_a_server_error() {
        let mut state = setup_test_app_state().await;
        state.mailer = Arc::new(UnreachableMailer);
        let server = TestServer::new(create_router(state)).unwrap();

        let response = server
            .post("/api/auth/forgot-password")
            .json(&json!({ "email": ADMIN_EMAIL }))
            .await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert!(!body.to_string().contains("reset-password?token="));

        // Nothing is sent for unknown addresses, so nothing can fail
        server
            .post("/api/auth/forgot-password")
            .json(&json!({ "email": "nobody@ums.test" }))
            .await
            .assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_change_password() {
        let (server, _) = setup_test_server().await;
        let token = admin_token(&server).await;

        let (name, value) = bearer(&token);
        server
            .post("/api/auth/change-password")
            .add_header(name, value)
            .json(&json!({ "current_password": "wrong-password", "new_password": "whatever-else" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        post(
            &server,
            &token,
            "/api/auth/change-password",
            json!({ "current_password": ADMIN_PASSWORD, "new_password": "changed-password" }),
        )
        .await;
        login(&server, ADMIN_EMAIL, "changed-password").await;
    }

    #[tokio::test]
    async fn test_metrics_disabled_in_tests() {
        let (server, _) = setup_test_server().await;

        server.get("/metrics").await.assert_status(StatusCode::NOT_FOUND);
    }
}
