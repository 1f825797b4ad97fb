use actix_web::cookie::{Cookie, Key};
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use backend::auth::password::hash_password;
use backend::config::AppConfig;
use backend::db::{self, Database};
use backend::store::activity::{self, NewActivityReport, NewDetail};
use backend::store::analysis::{self, AnalysisHeader};
use backend::store::users::{self, NewUser};
use backend::telegram::Telegram;
use backend::web::templates::Templates;
use backend::{configure_app, session_middleware};
use chrono::{NaiveDate, NaiveTime};
use common::model::choices::{ActivityCode, ReportStatus, Role, Shift};
use rstest::rstest;

const PASSWORD: &str = "rahasia-123";

macro_rules! app {
    ($db:expr) => {
        test::init_service(
            App::new()
                .wrap(session_middleware(Key::generate()))
                .app_data(web::Data::new($db.clone()))
                .app_data(web::Data::new(Templates::load().unwrap()))
                .app_data(web::Data::new(Telegram::disabled()))
                .app_data(web::Data::new(AppConfig::for_database(":memory:")))
                .configure(configure_app),
        )
        .await
    };
}

fn seed(db: &Database, username: &str, role: Role) -> i64 {
    seed_under(db, username, role, None)
}

fn seed_under(db: &Database, username: &str, role: Role, leader_id: Option<i64>) -> i64 {
    let conn = db.conn().unwrap();
    let record = NewUser {
        username: username.to_owned(),
        email: format!("{}@example.com", username),
        password_hash: hash_password(PASSWORD).unwrap(),
        first_name: username.to_owned(),
        last_name: String::new(),
        name: None,
        phone: None,
        nrp: None,
        telegram_chat_id: None,
        role,
        department: None,
        leader_id,
        shift: Shift::First,
        is_active: true,
    };
    users::insert(&conn, &record, db::now()).unwrap()
}

fn location(response: &actix_web::dev::ServiceResponse) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

fn session_cookie(response: &actix_web::dev::ServiceResponse) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|c| c.name() == "monman_session")
        .expect("session cookie")
        .into_owned()
}

macro_rules! login {
    ($app:expr, $username:expr) => {{
        let request = test::TestRequest::post()
            .uri("/login/")
            .set_form([("username", $username), ("password", PASSWORD)])
            .to_request();
        let response = test::call_service(&$app, request).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response)
    }};
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
}

fn seed_activity(db: &Database, foreman_id: i64, date: NaiveDate, rows: i64, status: ReportStatus) {
    let conn = db.conn().unwrap();
    let details = (1..=rows)
        .map(|n| NewDetail {
            activity_number: n,
            unit_code: format!("DT{}", n),
            hm_km: None,
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            stop_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            component: Some("Component_1".to_owned()),
            activities: format!("Service rutin {}", n),
            activity_code: Some(ActivityCode::Sc),
        })
        .collect();
    let report = NewActivityReport {
        foreman_id,
        date,
        shift: Shift::First,
        nrp: None,
        section: None,
        details,
    };
    let id = activity::insert(&conn, &report, db::now()).unwrap();
    activity::set_status(&conn, id, status, "").unwrap();
}

#[rstest]
#[case("/")]
#[case("/superadmin/")]
#[case("/leader/")]
#[case("/mekanik/")]
#[case("/notifications/")]
#[actix_web::test]
async fn anonymous_visitors_are_sent_to_login(#[case] path: &str) {
    let db = Database::open_in_memory().unwrap();
    let app = app!(db);
    let response = test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login/");
}

#[actix_web::test]
async fn login_page_renders() {
    let db = Database::open_in_memory().unwrap();
    let app = app!(db);
    let response =
        test::call_service(&app, test::TestRequest::get().uri("/login/").to_request()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = test::read_body(response).await;
    assert!(String::from_utf8_lossy(&body).contains("Monitoring Maintenance"));
}

#[rstest]
#[case("boss", Role::Superadmin, "/superadmin/")]
#[case("ketua", Role::Leader, "/leader/")]
#[case("mekanik1", Role::Foreman, "/mekanik/")]
#[actix_web::test]
async fn login_lands_on_role_dashboard(
    #[case] username: &str,
    #[case] role: Role,
    #[case] dashboard: &str,
) {
    let db = Database::open_in_memory().unwrap();
    seed(&db, username, role);
    let app = app!(db);

    let login = test::TestRequest::post()
        .uri("/login/")
        .set_form([("username", username), ("password", PASSWORD)])
        .to_request();
    let response = test::call_service(&app, login).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), dashboard);

    let page = test::TestRequest::get()
        .uri(dashboard)
        .cookie(session_cookie(&response))
        .to_request();
    let response = test::call_service(&app, page).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = test::read_body(response).await;
    assert!(String::from_utf8_lossy(&body).contains(&format!("Selamat datang, {}!", username)));
}

#[actix_web::test]
async fn wrong_password_shows_the_form_again() {
    let db = Database::open_in_memory().unwrap();
    seed(&db, "boss", Role::Admin);
    let app = app!(db);

    let login = test::TestRequest::post()
        .uri("/login/")
        .set_form([("username", "boss"), ("password", "salah")])
        .to_request();
    let response = test::call_service(&app, login).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = test::read_body(response).await;
    assert!(String::from_utf8_lossy(&body).contains("Username atau password salah."));
}

#[actix_web::test]
async fn foreman_cannot_open_admin_pages() {
    let db = Database::open_in_memory().unwrap();
    seed(&db, "mekanik1", Role::Foreman);
    let app = app!(db);

    let login = test::TestRequest::post()
        .uri("/login/")
        .set_form([("username", "mekanik1"), ("password", PASSWORD)])
        .to_request();
    let response = test::call_service(&app, login).await;
    let cookie = session_cookie(&response);

    let admin_page = test::TestRequest::get()
        .uri("/superadmin/quota/")
        .cookie(cookie)
        .to_request();
    let response = test::call_service(&app, admin_page).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/mekanik/");
}

#[actix_web::test]
async fn static_assets_are_served() {
    let db = Database::open_in_memory().unwrap();
    let app = app!(db);
    let response =
        test::call_service(&app, test::TestRequest::get().uri("/static/style.css").to_request())
            .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/css"
    );

    let missing =
        test::call_service(&app, test::TestRequest::get().uri("/static/nope.js").to_request())
            .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[rstest]
#[case("/mekanik/reports/?page=2")]
#[case("/mekanik/reports/?page=abc")]
#[case("/mekanik/reports/?page=-1")]
#[case("/mekanik/reports/?date=bad&month=zz")]
#[actix_web::test]
async fn report_list_ignores_bad_query_values(#[case] uri: &str) {
    let db = Database::open_in_memory().unwrap();
    seed(&db, "mekanik1", Role::Foreman);
    let app = app!(db);
    let cookie = login!(app, "mekanik1");

    let request = test::TestRequest::get().uri(uri).cookie(cookie).to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_web::test]
async fn report_export_follows_the_filters() {
    let db = Database::open_in_memory().unwrap();
    seed(&db, "boss", Role::Admin);
    let leader = seed(&db, "ketua", Role::Leader);
    let foreman = seed_under(&db, "mekanik1", Role::Foreman, Some(leader));
    seed_activity(&db, foreman, day(2), 2, ReportStatus::Approved);
    seed_activity(&db, foreman, day(10), 1, ReportStatus::Approved);
    seed_activity(&db, foreman, day(11), 1, ReportStatus::Pending);
    seed_activity(&db, foreman, day(20), 0, ReportStatus::Rejected);
    let app = app!(db);
    let cookie = login!(app, "boss");

    for (uri, lines) in [
        ("/export/reports/", 1 + 5),
        ("/export/reports/?status=approved", 1 + 3),
        ("/export/reports/?status=approved&start_date=2025-05-05", 1 + 1),
        ("/export/reports/?start_date=2025-05-11&end_date=2025-05-31", 1 + 2),
    ] {
        let request = test::TestRequest::get()
            .uri(uri)
            .cookie(cookie.clone())
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        assert_eq!(
            response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"activity_reports.csv\""
        );
        let body = test::read_body(response).await;
        let text = String::from_utf8_lossy(&body);
        assert_eq!(text.lines().count(), lines, "{}", uri);
        assert!(text.starts_with("Date,Foreman,Leader,Unit Code"));
    }
}

#[actix_web::test]
async fn oversized_text_field_is_reported_on_step_two() {
    let db = Database::open_in_memory().unwrap();
    let foreman = seed(&db, "mekanik1", Role::Foreman);
    let report_id = {
        let conn = db.conn().unwrap();
        let header = AnalysisHeader {
            foreman_id: foreman,
            section_track: Some("PC1250".into()),
            email: None,
            no_report: Some("AR-01".into()),
            report_date: day(20),
            wo_number: None,
            wo_date: day(20),
            unit_code: Some("EX1250".into()),
            problem: Some("1000".into()),
            trouble_date: day(20),
            hm: None,
            title_problem: "Overheat".into(),
            part_no: None,
            part_name: None,
        };
        analysis::insert(&conn, &header, db::now()).unwrap()
    };
    let app = app!(db);
    let cookie = login!(app, "mekanik1");

    let boundary = "monmanboundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"symptoms\"\r\n\r\n{text}\r\n--{b}--\r\n",
        b = boundary,
        text = "a".repeat(70 * 1024),
    );
    let request = test::TestRequest::post()
        .uri(&format!("/foreman/create-analysis-report/step2/{}/", report_id))
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        ))
        .cookie(cookie)
        .set_payload(body)
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = test::read_body(response).await;
    assert!(String::from_utf8_lossy(&page).contains("terlalu panjang"));

    let conn = db.conn().unwrap();
    assert_eq!(analysis::get(&conn, report_id).unwrap().symptoms, None);
}
