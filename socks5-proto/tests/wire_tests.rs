use bytes::BytesMut;
use socks5_proto::{
    handshake::{Method, Request as Greeting, Response as GreetingResponse},
    Address, Command, Error, ProtocolError, Reply, Request, Response, UdpHeader,
};
use std::net::{Ipv4Addr, Ipv6Addr};

fn encode<F>(write: F) -> Vec<u8>
where
    F: FnOnce(&mut BytesMut),
{
    let mut buf = BytesMut::new();
    write(&mut buf);
    buf.to_vec()
}

#[tokio::test]
async fn greeting_round_trip() {
    let greeting = Greeting::new(vec![Method::NO_AUTH, Method::PASSWORD]);
    let bytes = encode(|buf| greeting.write_to_buf(buf));

    assert_eq!(bytes, [0x05, 0x02, 0x00, 0x02]);
    assert_eq!(bytes.len(), greeting.serialized_len());

    let decoded = Greeting::read_from(&mut &bytes[..]).await.unwrap();
    assert_eq!(decoded.methods, greeting.methods);
}

#[tokio::test]
async fn greeting_reply_selects_method() {
    let decoded = GreetingResponse::read_from(&mut &[0x05, 0x00][..])
        .await
        .unwrap();
    assert_eq!(decoded.method, Method::NO_AUTH);
}

#[tokio::test]
async fn greeting_reply_rejects_unacceptable_method() {
    let err = GreetingResponse::read_from(&mut &[0x05, 0xff][..])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Protocol(ProtocolError::NoAcceptableMethod)
    ));
}

#[tokio::test]
async fn greeting_reply_rejects_version_mismatch() {
    let err = GreetingResponse::read_from(&mut &[0x04, 0x00][..])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Protocol(ProtocolError::Version { version: 0x04 })
    ));
}

#[tokio::test]
async fn connect_request_encodes_exact_bytes() {
    let request = Request::new(
        Command::Connect,
        Address::from((Ipv4Addr::new(93, 184, 216, 34), 80)),
    );
    let bytes = encode(|buf| request.write_to_buf(buf));

    assert_eq!(
        bytes,
        [0x05, 0x01, 0x00, 0x01, 0x5d, 0xb8, 0xd8, 0x22, 0x00, 0x50]
    );
}

#[tokio::test]
async fn command_reply_decodes_bound_address() {
    let bytes = [0x05, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x04, 0x38];
    let response = Response::read_from(&mut &bytes[..]).await.unwrap();

    assert_eq!(response.reply, Reply::Succeeded);
    assert_eq!(
        response.address,
        Address::from((Ipv4Addr::UNSPECIFIED, 1080))
    );
}

#[tokio::test]
async fn request_round_trips_every_address_variant() {
    let addresses = [
        Address::from((Ipv4Addr::new(10, 0, 0, 1), 8080)),
        Address::from((Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1), 443)),
        Address::from(("example.com", 80)),
    ];

    for address in addresses {
        let request = Request::new(Command::Associate, address.clone());
        let bytes = encode(|buf| request.write_to_buf(buf));
        assert_eq!(bytes.len(), request.serialized_len());

        let decoded = Request::read_from(&mut &bytes[..]).await.unwrap();
        assert_eq!(decoded.command, Command::Associate);
        assert_eq!(decoded.address, address);
    }
}

#[tokio::test]
async fn response_round_trips_every_address_variant() {
    let addresses = [
        Address::from((Ipv4Addr::new(127, 0, 0, 1), 1080)),
        Address::from((Ipv6Addr::LOCALHOST, 1080)),
        Address::from(("proxy.internal", 1080)),
    ];

    for address in addresses {
        let response = Response::new(Reply::Succeeded, address.clone());
        let bytes = encode(|buf| response.write_to_buf(buf));

        let decoded = Response::read_from(&mut &bytes[..]).await.unwrap();
        assert_eq!(decoded.reply, Reply::Succeeded);
        assert_eq!(decoded.address, address);
    }
}

#[tokio::test]
async fn command_reply_fails_on_truncated_address() {
    // ATYP announces IPv6 but only four address bytes follow
    let bytes = [0x05, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00];
    let err = Response::read_from(&mut &bytes[..]).await.unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[tokio::test]
async fn command_reply_fails_on_unknown_reply_code() {
    let bytes = [0x05, 0x09, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
    let err = Response::read_from(&mut &bytes[..]).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Protocol(ProtocolError::InvalidReply { reply: 0x09 })
    ));
}

#[tokio::test]
async fn udp_header_length_is_fixed_per_family() {
    let v4 = UdpHeader::new(0, Address::from((Ipv4Addr::new(192, 0, 2, 7), 53)));
    let v6 = UdpHeader::new(0, Address::from((Ipv6Addr::LOCALHOST, 53)));

    assert_eq!(v4.serialized_len(), 10);
    assert_eq!(v6.serialized_len(), 22);

    assert_eq!(encode(|buf| v4.write_to_buf(buf)).len(), 10);
    assert_eq!(encode(|buf| v6.write_to_buf(buf)).len(), 22);
}

#[tokio::test]
async fn udp_header_round_trips() {
    let addresses = [
        Address::from((Ipv4Addr::new(198, 51, 100, 1), 5353)),
        Address::from((Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 9), 5353)),
    ];

    for address in addresses {
        let header = UdpHeader::new(0, address.clone());
        let bytes = encode(|buf| header.write_to_buf(buf));

        let decoded = UdpHeader::read_from(&mut &bytes[..]).await.unwrap();
        assert_eq!(decoded.frag, 0);
        assert_eq!(decoded.address, address);
        assert_eq!(decoded.address.port(), 5353);
    }
}

#[tokio::test]
async fn udp_header_rejects_unknown_address_type() {
    let bytes = [0x00, 0x00, 0x00, 0x02, 0x7f, 0x00, 0x00, 0x01, 0x00, 0x35];
    let err = UdpHeader::read_from(&mut &bytes[..]).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Protocol(ProtocolError::InvalidAddressType { address_type: 0x02 })
    ));
}

#[test]
fn address_resolves_ip_literals_only() {
    let concrete = Address::from((Ipv4Addr::new(127, 0, 0, 1), 1080));
    assert_eq!(
        concrete.to_socket_addr().unwrap(),
        "127.0.0.1:1080".parse().unwrap()
    );

    let literal = Address::from(("::1", 1080));
    assert_eq!(
        literal.to_socket_addr().unwrap(),
        "[::1]:1080".parse().unwrap()
    );

    let named = Address::from(("example.com", 1080));
    assert!(named.to_socket_addr().is_err());
}
