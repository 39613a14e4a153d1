use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::metrics::METRICS;
use crate::state::AppState;

/// `/api` 的查询参数
#[derive(Debug, Default, Deserialize)]
pub struct OpQuery {
    pub op: Option<String>,
    pub tool: Option<String>,
    pub name: Option<String>,
    pub path1: Option<String>,
    pub path2: Option<String>,
    pub port: Option<String>,
}

/// 按 `op` 分发到注册表；失败时以错误描述作为正文，状态码始终为 200
pub async fn handle_op(data: web::Data<AppState>, query: web::Query<OpQuery>) -> impl Responder {
    let query = query.into_inner();

    match query.op.as_deref() {
        Some("add") => {
            let result = data
                .add(
                    query.tool.as_deref().unwrap_or_default(),
                    query.name.as_deref().unwrap_or_default(),
                    query.path1.as_deref().unwrap_or_default(),
                    query.path2.as_deref().unwrap_or_default(),
                )
                .await;
            METRICS.record("add", result.is_ok());
            match result {
                Ok(port) => text(port.to_string()),
                Err(e) => text(e.to_string()),
            }
        }
        Some("rmv") => {
            let result = data.remove(query.port.as_deref());
            METRICS.record("rmv", result.is_ok());
            match result {
                Ok(()) => text("ok".to_string()),
                Err(e) => {
                    log::warn!("rmv rejected: {} ({:?})", e, query.port);
                    text(e.to_string())
                }
            }
        }
        Some("get") => {
            METRICS.record("get", true);
            let body = serde_json::to_string(&data.list()).unwrap_or_else(|e| {
                log::error!("Failed to encode registry: {}", e);
                "[]".to_string()
            });
            HttpResponse::Ok().content_type("application/json").body(body)
        }
        other => {
            log::warn!("Unsupported op: {:?}", other);
            text("op not support".to_string())
        }
    }
}

fn text(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain; charset=utf-8").body(body)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::models::SheepSummary;
    use crate::state::new_state;
    use crate::test_support::{fake_tools, shepherd_in};
    use actix_web::{test, App};

    async fn call(state: &AppState, uri: &str) -> String {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .route("/api", web::to(handle_op)),
        )
        .await;
        let req = test::TestRequest::get().uri(uri).to_request();
        let body = test::call_and_read_body(&app, req).await;
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[actix_web::test]
    async fn add_get_rmv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let state = new_state(shepherd_in(dir.path(), fake_tools()));

        let port: u16 = call(&state, "/api?op=add&tool=1&name=svc&path1=/tmp/trace.out")
            .await
            .parse()
            .unwrap();

        let listed: Vec<SheepSummary> =
            serde_json::from_str(&call(&state, "/api?op=get").await).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "svc");
        assert_eq!(listed[0].port, port);
        assert_eq!(listed[0].path1, "/tmp/trace.out");

        assert_eq!(call(&state, &format!("/api?op=rmv&port={}", port)).await, "ok");
        assert_eq!(call(&state, "/api?op=get").await, "[]");
    }

    #[actix_web::test]
    async fn get_uses_client_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let state = new_state(shepherd_in(dir.path(), fake_tools()));
        call(&state, "/api?op=add&tool=2&name=cmp&path1=/tmp/a&path2=/tmp/b").await;

        let value: serde_json::Value =
            serde_json::from_str(&call(&state, "/api?op=get").await).unwrap();
        let item = &value[0];
        assert_eq!(item["Name"], "cmp");
        assert_eq!(item["Path1"], "/tmp/a");
        assert_eq!(item["Path2"], "/tmp/b");
        assert!(item["Port"].is_u64());
        assert!(item.get("Inst").is_none());
    }

    #[actix_web::test]
    async fn rejects_bad_input_with_descriptive_text() {
        let dir = tempfile::tempdir().unwrap();
        let state = new_state(shepherd_in(dir.path(), fake_tools()));

        assert_eq!(call(&state, "/api?op=rmv").await, "invalid port");
        assert_eq!(call(&state, "/api?op=rmv&port=abc").await, "invalid port");
        assert_eq!(call(&state, "/api?op=rmv&port=0").await, "invalid port");
        assert_eq!(call(&state, "/api?op=add&tool=7&path1=/tmp/a").await, "invalid tool type");
        assert_eq!(call(&state, "/api?op=nope").await, "op not support");
        assert_eq!(call(&state, "/api").await, "op not support");
        assert!(!state.config_path().exists());
    }

    #[actix_web::test]
    async fn rmv_of_unknown_port_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let state = new_state(shepherd_in(dir.path(), fake_tools()));
        assert_eq!(call(&state, "/api?op=rmv&port=12345").await, "ok");
    }

    #[actix_web::test]
    async fn health_reports_healthy() {
        let app = test::init_service(App::new().route("/health", web::get().to(crate::api::health))).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
    }
}
