use socks5_proto::{
    handshake::{Method, Request as Greeting, Response as GreetingResponse},
    Address, Command, Reply, Request, Response, UdpHeader,
};
use std::net::{Ipv4Addr, SocketAddr};
use tokio::{
    io::AsyncReadExt,
    net::{TcpListener, TcpStream, UdpSocket},
    task::JoinHandle,
};

pub struct Script {
    pub method: Method,
    pub reply: Reply,
    pub bound: Address,
}

/// One-shot proxy double: accepts a single control connection, answers the
/// greeting and the first command from the script, then parks the
/// connection until the client closes it.
pub async fn spawn_proxy(script: Script) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy_addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        serve_control(&mut stream, &script).await;
        park(stream).await;
    });

    (proxy_addr, handle)
}

/// Proxy double that grants ASSOCIATE and echoes every relayed datagram
/// back to its sender, header included.
pub async fn spawn_udp_echo_proxy(
    method: Method,
    advertise_unspecified: bool,
) -> (SocketAddr, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let udp = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    let proxy_addr = listener.local_addr().unwrap();
    let udp_addr = udp.local_addr().unwrap();

    tokio::spawn(async move {
        let bound = if advertise_unspecified {
            Address::from((Ipv4Addr::UNSPECIFIED, udp_addr.port()))
        } else {
            Address::from(udp_addr)
        };

        let (mut stream, _) = listener.accept().await.unwrap();
        let request = serve_control(
            &mut stream,
            &Script {
                method,
                reply: Reply::Succeeded,
                bound,
            },
        )
        .await;
        assert_eq!(request.command, Command::Associate);

        loop {
            let mut buf = vec![0; 2048];
            let (len, src) = udp.recv_from(&mut buf).await.unwrap();
            buf.truncate(len);

            let header = UdpHeader::read_from(&mut &buf[..]).await.unwrap();
            assert_eq!(header.frag, 0);

            udp.send_to(&buf, src).await.unwrap();
        }
    });

    (proxy_addr, udp_addr)
}

async fn serve_control(stream: &mut TcpStream, script: &Script) -> Request {
    let greeting = Greeting::read_from(stream).await.unwrap();
    assert!(greeting.methods.contains(&script.method));

    GreetingResponse::new(script.method)
        .write_to(stream)
        .await
        .unwrap();

    let request = Request::read_from(stream).await.unwrap();
    Response::new(script.reply, script.bound.clone())
        .write_to(stream)
        .await
        .unwrap();

    request
}

async fn park(mut stream: TcpStream) {
    let mut buf = [0; 64];
    while matches!(stream.read(&mut buf).await, Ok(n) if n > 0) {}
}
