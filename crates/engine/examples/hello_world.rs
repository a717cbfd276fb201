use std::io::Write;

use async_trait::async_trait;
use http::StatusCode;
use micro_engine::buffer::ResponseBuffer;
use micro_engine::handler::Handler;
use micro_engine::protocol::{Method, Request};
use micro_engine::server::Server;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let server = match Server::builder().port(8080).bind(HelloWorld) {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    server.run().await;
}

struct HelloWorld;

#[async_trait(?Send)]
impl Handler for HelloWorld {
    type Error = std::io::Error;

    async fn call(&self, request: &Request, response: &mut ResponseBuffer) -> Result<(), Self::Error> {
        info!(method = %request.method(), uri = %request.uri(), "receiving request");

        match request.method() {
            Method::Post | Method::Put => {
                let body = request.body().unwrap_or_default();
                info!(body = %String::from_utf8_lossy(body), "receiving request body");
                response.status(StatusCode::OK).header("Server", "micro").body(body);
            }
            Method::Head => {
                response.status(StatusCode::OK).header("Server", "micro");
                write!(response, "content-length: 14\r\n\r\n")?;
            }
            Method::Get => {
                response.status(StatusCode::OK).header("Server", "micro").body("Hello World!\r\n");
            }
        }
        Ok(())
    }
}
