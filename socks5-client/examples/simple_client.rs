use socks5_client::{auth::NoAuth, Session};
use socks5_proto::Address;
use std::{error::Error, net::Ipv4Addr, sync::Arc};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let proxy_addr = "127.0.0.1:1080".parse()?;
    let mut session = Session::connect(proxy_addr, Arc::new(NoAuth)).await?;

    let bound = session
        .connect_tcp(Address::from((Ipv4Addr::new(93, 184, 216, 34), 80)))
        .await?;
    println!("relay established, proxy bound to {bound}");

    let stream = session.stream_mut()?;
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: example.com\r\nConnection: close\r\n\r\n")
        .await?;

    let mut body = Vec::new();
    stream.read_to_end(&mut body).await?;
    println!("{}", String::from_utf8_lossy(&body));

    session.close().await;

    Ok(())
}
