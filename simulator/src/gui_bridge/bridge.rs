use crate::gui_bridge::model::VisualizationModel;
use crate::workflow::session::Session;
use anyhow::Context;
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;
use sightcore::processing::Granularity;
use sightcore::record::CategoryKey;
use sightcore::selection::Focus;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter};

type SharedSession = Arc<RwLock<Session>>;

pub fn gui_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Debug, Deserialize)]
struct CategoryBody {
    category: CategoryKey,
}

#[derive(Debug, Deserialize)]
struct GranularityBody {
    granularity: String,
}

fn read(session: &SharedSession) -> RwLockReadGuard<'_, Session> {
    session.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(session: &SharedSession) -> RwLockWriteGuard<'_, Session> {
    session.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn respond(
    result: anyhow::Result<VisualizationModel>,
    failure: StatusCode,
) -> warp::reply::WithStatus<warp::reply::Json> {
    match result {
        Ok(model) => warp::reply::with_status(warp::reply::json(&model), StatusCode::OK),
        Err(err) => {
            warn!("bridge request failed: {:#}", err);
            warp::reply::with_status(
                warp::reply::json(&json!({"status": "error", "error": format!("{:#}", err)})),
                failure,
            )
        }
    }
}

/// HTTP endpoint handing the session's current view to rendering clients.
pub struct GuiBridge {
    session: SharedSession,
}

impl GuiBridge {
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
        }
    }

    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let shared = self.session.clone();
        let session_filter = warp::any().map(move || shared.clone());

        let view_route = warp::path("view")
            .and(warp::path::end())
            .and(warp::get())
            .and(session_filter.clone())
            .map(|session: SharedSession| {
                respond(read(&session).model(), StatusCode::INTERNAL_SERVER_ERROR)
            });

        let identities_route = warp::path("identities")
            .and(warp::path::end())
            .and(warp::get())
            .and(session_filter.clone())
            .map(|session: SharedSession| {
                let result = read(&session).model().map(|model| model.identities);
                match result {
                    Ok(identities) => {
                        warp::reply::with_status(warp::reply::json(&identities), StatusCode::OK)
                    }
                    Err(err) => warp::reply::with_status(
                        warp::reply::json(&json!({"status": "error", "error": format!("{:#}", err)})),
                        StatusCode::INTERNAL_SERVER_ERROR,
                    ),
                }
            });

        let category_route = warp::path!("select" / "category")
            .and(warp::post())
            .and(warp::body::json())
            .and(session_filter.clone())
            .map(|body: CategoryBody, session: SharedSession| {
                let mut guard = write(&session);
                let result = guard
                    .select_category(body.category)
                    .and_then(|()| guard.model());
                respond(result, StatusCode::BAD_REQUEST)
            });

        let focus_route = warp::path!("select" / "focus")
            .and(warp::post())
            .and(warp::body::json())
            .and(session_filter.clone())
            .map(|focus: Focus, session: SharedSession| {
                let mut guard = write(&session);
                let result = guard.select_focus(focus).and_then(|()| guard.model());
                respond(result, StatusCode::BAD_REQUEST)
            });

        let granularity_route = warp::path!("select" / "granularity")
            .and(warp::post())
            .and(warp::body::json())
            .and(session_filter)
            .map(|body: GranularityBody, session: SharedSession| {
                let mut guard = write(&session);
                let result = body
                    .granularity
                    .parse::<Granularity>()
                    .context("selecting granularity")
                    .and_then(|granularity| {
                        guard.select_granularity(granularity);
                        guard.model()
                    });
                respond(result, StatusCode::BAD_REQUEST)
            });

        view_route
            .or(identities_route)
            .or(category_route)
            .or(focus_route)
            .or(granularity_route)
    }

    /// Binds `address`, then serves the routes on a dedicated thread with its
    /// own runtime. Bind failures are returned to the caller.
    pub fn spawn(&self, address: SocketAddr) -> anyhow::Result<thread::JoinHandle<()>> {
        let routes = self.routes();
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("building bridge runtime")?;
        let (bound, server) = {
            let _guard = runtime.enter();
            warp::serve(routes)
                .try_bind_ephemeral(address)
                .with_context(|| format!("binding bridge to {}", address))?
        };
        let handle = thread::spawn(move || runtime.block_on(server));
        info!("bridge listening on http://{}", bound);
        Ok(handle)
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> anyhow::Result<VisualizationModel> {
        read(&self.session).model()
    }

    pub fn publish_status(&self, message: &str) {
        info!("[GUI] {}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::runner::tests::{runner_with, table};
    use serde_json::Value;

    fn bridge() -> GuiBridge {
        let runner = runner_with(vec![
            (
                "face",
                table(&[
                    ["F1", "77.1", "28.6", "2024-01-01T10:00"],
                    ["F2", "77.2", "28.7", "2024-01-02T09:00"],
                ]),
            ),
            ("car", table(&[["C1", "77.3", "28.8", "2024-02-01T08:00"]])),
        ]);
        GuiBridge::new(Session::start(runner).unwrap())
    }

    fn body<B: AsRef<[u8]>>(response: &warp::http::Response<B>) -> Value {
        serde_json::from_slice(response.body().as_ref()).unwrap()
    }

    #[tokio::test]
    async fn view_route_returns_overview() {
        let bridge = bridge();
        let response = warp::test::request()
            .method("GET")
            .path("/view")
            .reply(&bridge.routes())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body(&response);
        assert_eq!(json["view"]["kind"], "overview");
        assert_eq!(json["selection"]["category"], "face");
    }

    #[tokio::test]
    async fn identities_route_lists_first_seen_order() {
        let bridge = bridge();
        let response = warp::test::request()
            .path("/identities")
            .reply(&bridge.routes())
            .await;
        assert_eq!(body(&response), json!(["F1", "F2"]));
    }

    #[tokio::test]
    async fn focus_then_granularity_updates_series() {
        let bridge = bridge();
        let routes = bridge.routes();

        let response = warp::test::request()
            .method("POST")
            .path("/select/focus")
            .json(&json!({"kind": "identity", "identity": "F2"}))
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body(&response);
        assert_eq!(json["view"]["kind"], "series");
        assert_eq!(json["view"]["model"]["unit_label"], "Date");

        let response = warp::test::request()
            .method("POST")
            .path("/select/granularity")
            .json(&json!({"granularity": "monthly"}))
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body(&response);
        assert_eq!(json["view"]["model"]["unit_label"], "Month");
        assert_eq!(
            json["view"]["model"]["series"]["buckets"],
            json!([{"label": "2024-01", "count": 1}])
        );
    }

    #[tokio::test]
    async fn invalid_selections_are_bad_requests() {
        let bridge = bridge();
        let routes = bridge.routes();

        let response = warp::test::request()
            .method("POST")
            .path("/select/focus")
            .json(&json!({"kind": "identity", "identity": "C1"}))
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = warp::test::request()
            .method("POST")
            .path("/select/granularity")
            .json(&json!({"granularity": "yearly"}))
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body(&response)["error"]
            .as_str()
            .unwrap()
            .contains("unknown granularity"));
    }

    #[test]
    fn spawn_reports_bind_failure() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let address = taken.local_addr().unwrap();
        let err = bridge().spawn(address).unwrap_err();
        assert!(format!("{:#}", err).contains("binding bridge"));
    }

    #[test]
    fn spawn_serves_on_free_port() {
        let free = SocketAddr::from(([127, 0, 0, 1], 0));
        assert!(bridge().spawn(free).is_ok());
    }

    #[tokio::test]
    async fn category_switch_resets_focus() {
        let bridge = bridge();
        let routes = bridge.routes();

        warp::test::request()
            .method("POST")
            .path("/select/focus")
            .json(&json!({"kind": "identity", "identity": "F1"}))
            .reply(&routes)
            .await;
        let response = warp::test::request()
            .method("POST")
            .path("/select/category")
            .json(&json!({"category": "car"}))
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let snapshot = bridge.snapshot().unwrap();
        assert_eq!(snapshot.selection.category().as_str(), "car");
        assert_eq!(snapshot.selection.focus(), &Focus::Overview);
    }
}
