use http::{Method, Request};
use micro_dispatch::{App, Context, Json, handler_fn, middleware_fn, try_handler_fn};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Default)]
struct Stats {
    requests: AtomicUsize,
}

#[derive(Serialize)]
struct StatsView {
    requests: usize,
}

async fn hello(ctx: Context<Stats>) -> String {
    let started = ctx.scratch().get::<Instant>("started").map(Instant::elapsed).unwrap_or_default();
    format!("hello world, served in {started:?}\r\n")
}

async fn stats(ctx: Context<Stats>) -> Json<StatsView> {
    Json(StatsView { requests: ctx.state().requests.load(Ordering::Relaxed) })
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let app = App::new().with_state(Stats::default());
    app.middleware(middleware_fn(|ctx: &mut Context<Stats>| {
        Box::pin(async move {
            ctx.state().requests.fetch_add(1, Ordering::Relaxed);
            ctx.scratch_mut().insert("started", Instant::now());
            Ok(())
        })
    }));

    app.get("/", handler_fn(hello))
        .get("/stats", handler_fn(stats))
        .all("/echo", try_handler_fn(|mut ctx: Context<Stats>| async move { ctx.text().await }));

    let requests = [
        Request::get("/").body(String::new()),
        Request::post("/echo").body("ping".to_string()),
        Request::builder().method(Method::PATCH).uri("/echo").body(String::new()),
        Request::get("/stats").body(String::new()),
    ];

    for request in requests {
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                error!(cause = %e, "build request error");
                continue;
            }
        };

        let (method, uri) = (request.method().clone(), request.uri().clone());
        match app.fetch(request).await {
            Ok(response) => {
                let body = String::from_utf8_lossy(response.body().as_bytes()).into_owned();
                info!(%method, %uri, status = %response.status(), body = body.trim_end(), "dispatched");
            }
            Err(e) => error!(%method, %uri, cause = %e, "dispatch error"),
        }
    }
}
