use grid_staging::{Identity, RemoteCollection, RemoteErrorKind, ServerId};
use org_admin::{ApiClient, ApiConfig, ConsoleConfig, Permission, Role, RoleAction, RolePermissionScreen};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn api_config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        base_url: format!("{}/api", server.uri()),
        timeout_ms: 2_000,
        auth_token: None,
    }
}

#[tokio::test]
async fn create_accepts_numeric_ids() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/roles"))
        .and(body_partial_json(json!({"roleCode": "AUDIT", "roleName": "Auditor"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 42})))
        .expect(1)
        .mount(&server)
        .await;

    let roles = ApiClient::new(&api_config(&server)).unwrap().collection::<Role>();
    let id = roles.create(&Role::new("AUDIT", "Auditor")).await.unwrap();

    assert_eq!(id, ServerId::new("42"));
}

#[tokio::test]
async fn scoped_list_sends_the_master_id() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/permissions"))
        .and(query_param("roleId", "R7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "P1", "roleId": "R7", "menuCode": "MENU_A", "canRead": true},
            {"id": 2, "roleId": "R7", "menuCode": "MENU_B", "canRead": true, "canWrite": true}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let permissions = ApiClient::new(&api_config(&server)).unwrap().collection::<Permission>();
    let rows = permissions.list(Some(&ServerId::new("R7"))).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].0, ServerId::new("P1"));
    assert_eq!(rows[1].0, ServerId::new("2"));
    assert_eq!(rows[1].1.role, Identity::Server(ServerId::new("R7")));
    assert!(rows[1].1.can_write);
}

#[tokio::test]
async fn error_statuses_map_to_error_kinds() {
    init_logging();
    let server = MockServer::start().await;
    for (id, status) in [("1", 409u16), ("2", 401), ("3", 404), ("4", 500)] {
        Mock::given(method("PUT"))
            .and(path(format!("/api/roles/{id}")))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
    }
    Mock::given(method("DELETE"))
        .and(path("/api/roles/5"))
        .respond_with(ResponseTemplate::new(422).set_body_string("role is still assigned"))
        .mount(&server)
        .await;

    let roles = ApiClient::new(&api_config(&server)).unwrap().collection::<Role>();
    let role = Role::new("CLERK", "Clerk");
    let mut kinds = Vec::new();
    for id in ["1", "2", "3", "4"] {
        let error = roles.update(&ServerId::new(id), &role).await.unwrap_err();
        kinds.push(error.kind);
    }
    assert_eq!(
        kinds,
        vec![
            RemoteErrorKind::Conflict,
            RemoteErrorKind::Unauthorized,
            RemoteErrorKind::NotFound,
            RemoteErrorKind::Rejected,
        ]
    );

    let error = roles.remove(&ServerId::new("5")).await.unwrap_err();
    assert_eq!(error.kind, RemoteErrorKind::Rejected);
    assert!(error.message.contains("role is still assigned"), "{}", error.message);
}

#[tokio::test]
async fn bearer_token_is_sent_when_configured() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/roles/9"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let config = ApiConfig {
        auth_token: Some("s3cret".to_string()),
        ..api_config(&server)
    };
    let roles = ApiClient::new(&config).unwrap().collection::<Role>();

    roles.remove(&ServerId::new("9")).await.unwrap();
}

#[tokio::test]
async fn unparseable_body_is_a_transport_error() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let roles = ApiClient::new(&api_config(&server)).unwrap().collection::<Role>();
    let error = roles.list(None).await.unwrap_err();

    assert!(error.is_transient());
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    init_logging();
    let config = ApiConfig {
        base_url: "http://127.0.0.1:1/api".to_string(),
        timeout_ms: 500,
        auth_token: None,
    };
    let roles = ApiClient::new(&config).unwrap().collection::<Role>();
    let error = roles.list(None).await.unwrap_err();

    assert_eq!(error.kind, RemoteErrorKind::Transport);
}

#[tokio::test]
async fn role_screen_assigns_a_permission_over_http() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "roleCode": "ADMIN", "roleName": "Administrator", "isSystem": true}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/permissions"))
        .and(query_param("roleId", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/permissions"))
        .and(query_param("roleId", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 9, "roleId": "1", "menuCode": "MENU_A", "canRead": true}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/permissions"))
        .and(body_partial_json(json!({"roleId": "1", "menuCode": "MENU_A"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9})))
        .expect(1)
        .mount(&server)
        .await;

    let config = ConsoleConfig {
        api: api_config(&server),
        ..ConsoleConfig::default()
    };
    let mut screen = RolePermissionScreen::connect(&config).unwrap();
    for action in [
        RoleAction::Load,
        RoleAction::SelectRole { row: Some("srv:1".to_string()) },
        RoleAction::AddPermission { menu_code: "MENU_A".to_string() },
        RoleAction::Commit,
    ] {
        screen.dispatch(action);
    }
    while screen.has_pending_actions() {
        screen.update().await;
    }

    let outcome = screen.last_outcome().expect("commit ran");
    assert!(outcome.is_success());
    assert_eq!(outcome.detail.committed_count(), 1);
    let detail = screen.controller().detail().rows();
    assert_eq!(detail.len(), 1);
    assert_eq!(detail[0].identity(), &Identity::Server(ServerId::new("9")));
    assert!(!screen.controller().has_pending_changes());
}
