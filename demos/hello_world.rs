use h2bridge::*;
use std::net::TcpListener;

fn handler(mut req: Request) {
    println!("{} {} (host: {:?})", req.method(), req.path(), req.host());
    let result = if req.method() == "GET" && req.path() == "/" {
        req.respond(200, [("content-type", "text/html")], "<H1>Hello, World</H1>")
    } else {
        let body = format!("{req:#?}\n");
        req.respond(404, [], body)
    };
    if let Err(err) = result {
        eprintln!("respond failed: {err}");
    }
}

async fn echo(mut req: Request, _: Scheduler) {
    let payload = req.payload().cloned().unwrap_or_default();
    let _ = req.respond(200, [("content-type", "application/octet-stream")], payload);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let native = NativeLoop::current()?;

    let server = Server::new(
        [SocketArg::from(TcpListener::bind("127.0.0.1:4433")?)],
        CallbackArg::from_fn(handler),
        Options::new().event_loop(native.clone()),
    )?;
    let echo = Server::new(
        [SocketArg::from(TcpListener::bind("127.0.0.1:4434")?)],
        CallbackArg::from_async_fn(echo),
        Options::new().event_loop(Scheduler::new(native)),
    )?;

    println!("h2c on {:?} and {:?}", server.local_addrs(), echo.local_addrs());

    tokio::signal::ctrl_c().await?;
    println!("\nClosing...");
    server.close();
    echo.close();
    Ok(())
}
