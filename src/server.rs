use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::Filter;

use crate::model::Address;
use crate::query::{QueryError, QueryRequest};
use crate::source::AccountSource;
use crate::Archive;

#[derive(Debug, Default, Deserialize)]
pub struct RecordsParams {
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: Option<usize>,
}

impl RecordsParams {
    fn to_request(&self) -> Result<QueryRequest, QueryError> {
        let request = QueryRequest::new(self.category.as_deref(), self.search.as_deref())?;
        match self.limit {
            Some(limit) => request.with_limit(limit),
            None => Ok(request),
        }
    }
}

type ApiReply = WithStatus<Json>;

fn ok<T: serde::Serialize>(body: &T) -> ApiReply {
    warp::reply::with_status(warp::reply::json(body), StatusCode::OK)
}

fn error_reply(status: StatusCode, message: impl ToString) -> ApiReply {
    warp::reply::with_status(warp::reply::json(&json!({ "error": message.to_string() })), status)
}

pub fn routes<S>(archive: Arc<Archive<S>>) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone
where
    S: AccountSource + 'static,
{
    // 1. GET /records?category=&search=&limit=
    let list = warp::get()
        .and(warp::path("records"))
        .and(warp::path::end())
        .and(warp::query::<RecordsParams>())
        .and(with_archive(archive.clone()))
        .map(|params: RecordsParams, archive: Arc<Archive<S>>| match params.to_request() {
            Ok(request) => ok(&archive.query(&request)),
            Err(e) => error_reply(StatusCode::BAD_REQUEST, e),
        });

    // 2. GET /records/{address}
    let show = warp::get()
        .and(warp::path!("records" / String))
        .and(with_archive(archive.clone()))
        .map(|raw: String, archive: Arc<Archive<S>>| match raw.parse::<Address>() {
            Ok(address) => match archive.get(&address) {
                Some(record) => ok(&record),
                None => error_reply(StatusCode::NOT_FOUND, format!("no record at {}", address)),
            },
            Err(e) => error_reply(StatusCode::BAD_REQUEST, e),
        });

    // 3. GET /categories
    let categories = warp::get()
        .and(warp::path!("categories"))
        .and(with_archive(archive.clone()))
        .map(|archive: Arc<Archive<S>>| ok(&archive.categories()));

    // 4. GET /report
    let report = warp::get()
        .and(warp::path!("report"))
        .and(with_archive(archive.clone()))
        .map(|archive: Arc<Archive<S>>| ok(&archive.last_report()));

    // 5. POST /reload
    let reload = warp::post()
        .and(warp::path!("reload"))
        .and(with_archive(archive))
        .and_then(reload_archive::<S>);

    list.or(show).or(categories).or(report).or(reload)
}

async fn reload_archive<S>(archive: Arc<Archive<S>>) -> Result<ApiReply, Infallible>
where
    S: AccountSource + 'static,
{
    Ok(match archive.reload().await {
        Ok(report) => ok(&report),
        Err(e) => {
            warn!(error = %e, "reload requested over http failed");
            error_reply(StatusCode::BAD_GATEWAY, e)
        }
    })
}

fn with_archive<S>(archive: Arc<Archive<S>>) -> impl Filter<Extract = (Arc<Archive<S>>,), Error = Infallible> + Clone
where
    S: AccountSource + 'static,
{
    warp::any().map(move || archive.clone())
}

/// Serve the read API on `addr` until `shutdown` resolves.
pub async fn serve<S>(
    archive: Arc<Archive<S>>,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), warp::Error>
where
    S: AccountSource + 'static,
{
    let (bound, server) = warp::serve(routes(archive)).try_bind_with_graceful_shutdown(addr, shutdown)?;
    info!(addr = %bound, "clio http api listening");
    server.await;
    Ok(())
}
