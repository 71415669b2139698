//! Integration tests for streamsift.
//!
//! Exercises the public API end to end using synthetic streams and frames.

use streamsift::prelude::*;
use streamsift::protocol::usbpcap::{transfer, TransferDirection};
use streamsift::protocol::HeaderFormat;

fn client(id: u64, ts: f64, text: &str) -> Message {
    Message::new(id, ts, Direction::AtoB, text)
}

fn server(id: u64, ts: f64, text: &str) -> Message {
    Message::new(id, ts, Direction::BtoA, text)
}

/// Build an SMTP transcript that delivers `data` as the message payload.
fn smtp_transcript(data: &str) -> Vec<Message> {
    vec![
        server(1, 0.0, "220 mx.example.org ESMTP ready\r\n"),
        client(2, 0.1, "EHLO laptop\r\n"),
        server(3, 0.2, "250-mx.example.org\r\n250-AUTH LOGIN PLAIN\r\n250 8BITMIME\r\n"),
        client(4, 0.3, "AUTH LOGIN\r\n"),
        server(5, 0.4, "334 VXNlcm5hbWU6\r\n"),
        client(6, 0.5, "YWxpY2U=\r\n"),
        server(7, 0.6, "334 UGFzc3dvcmQ6\r\n"),
        client(8, 0.7, "c2VjcmV0\r\n"),
        server(9, 0.8, "235 2.7.0 Authentication successful\r\n"),
        client(10, 0.9, "MAIL FROM:<alice@example.org>\r\n"),
        server(11, 1.0, "250 2.1.0 Ok\r\n"),
        client(12, 1.1, "RCPT TO:<bob@example.net>\r\n"),
        server(13, 1.2, "250 2.1.5 Ok\r\n"),
        client(14, 1.3, "RCPT TO:<carol@example.net>\r\n"),
        server(15, 1.4, "250 2.1.5 Ok\r\n"),
        client(16, 1.5, "DATA\r\n"),
        server(17, 1.6, "354 End data with <CR><LF>.<CR><LF>\r\n"),
        client(18, 1.7, data),
        client(19, 1.8, ".\r\n"),
        server(20, 1.9, "250 2.0.0 Ok: queued as 12345\r\n"),
        client(21, 2.0, "QUIT\r\n"),
        server(22, 2.1, "221 2.0.0 Bye\r\n"),
    ]
}

#[test]
fn test_http_n_requests_n_sessions() {
    let mut messages = Vec::new();
    for i in 0..5u64 {
        let ts = i as f64;
        messages.push(client(i * 2, ts, &format!("GET /item/{i} HTTP/1.1\r\nHost: shop\r\n\r\n")));
        messages.push(server(
            i * 2 + 1,
            ts + 0.5,
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nok",
        ));
    }

    let result = reconstruct_http(&messages);

    assert_eq!(result.sessions.len(), 5);
    assert!(result.sessions.iter().all(|s| s.response_time_seconds >= 0.0));
    for (i, session) in result.sessions.iter().enumerate() {
        assert_eq!(session.request.path, format!("/item/{i}"));
    }
    assert_eq!(result.stats.total_requests, 5);
    assert_eq!(result.stats.successful_responses, 5);
    assert!((result.stats.avg_response_time_seconds - 0.5).abs() < 1e-9);
}

#[test]
fn test_http_fragmented_response_body() {
    let messages = vec![
        client(1, 0.0, "POST /upload HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc"),
        server(2, 0.1, "HTTP/1.1 201 Created\r\nContent-Length: 12\r\n\r\nfirst"),
        server(3, 0.2, "-second"),
        server(4, 0.3, "!"),
        client(5, 0.4, "GET /next HTTP/1.1\r\n\r\n"),
        server(6, 0.5, "HTTP/1.1 404 Not Found\r\n\r\n"),
    ];

    let result = reconstruct_http(&messages);

    assert_eq!(result.sessions.len(), 2);
    assert_eq!(result.sessions[0].request.body, "abc");
    assert_eq!(result.sessions[0].response.body, "first-second!");
    assert_eq!(result.sessions[1].response.status_code, 404);
    assert_eq!(result.stats.error_responses, 1);
}

#[test]
fn test_smtp_full_session() {
    let data = "From: Alice <alice@example.org>\r\n\
                To: Bob <bob@example.net>\r\n\
                Subject: Quarterly numbers\r\n\
                Date: Mon, 2 Mar 2026 10:00:00 +0000\r\n\
                MIME-Version: 1.0\r\n\
                Content-Type: multipart/mixed;\r\n\
                \tboundary=\"outer\"\r\n\
                \r\n\
                This is a multi-part message in MIME format.\r\n\
                --outer\r\n\
                Content-Type: multipart/alternative; boundary=\"inner\"\r\n\
                \r\n\
                --inner\r\n\
                Content-Type: text/plain; charset=\"utf-8\"\r\n\
                Content-Transfer-Encoding: quoted-printable\r\n\
                \r\n\
                Numbers are =\r\n\
                attached.\r\n\
                --inner\r\n\
                Content-Type: text/html; charset=\"utf-8\"\r\n\
                Content-Transfer-Encoding: base64\r\n\
                \r\n\
                PHA+TnVtYmVycyBhcmUgYXR0YWNoZWQuPC9wPg==\r\n\
                --inner--\r\n\
                --outer\r\n\
                Content-Type: application/pdf; name=\"q1.pdf\"\r\n\
                Content-Disposition: attachment; filename=\"q1.pdf\"\r\n\
                Content-Transfer-Encoding: base64\r\n\
                \r\n\
                JVBERi0xLjQK\r\n\
                --outer--\r\n";

    let endpoints = StreamEndpoints::new("192.0.2.10:51000", "198.51.100.5:25");
    let session = reconstruct_smtp(&smtp_transcript(data), &endpoints);

    assert_eq!(session.client, "192.0.2.10:51000");
    assert_eq!(session.mail_from.as_deref(), Some("alice@example.org"));
    assert_eq!(session.rcpt_to, vec!["bob@example.net", "carol@example.net"]);
    assert_eq!(session.authentication.method.as_deref(), Some("LOGIN"));
    assert!(session.authentication.success);

    assert_eq!(session.headers.subject.as_deref(), Some("Quarterly numbers"));
    assert_eq!(session.headers.mime_version.as_deref(), Some("1.0"));
    assert_eq!(
        session.headers.content_type.as_deref(),
        Some("multipart/mixed; boundary=\"outer\"")
    );

    assert_eq!(session.plain_body.as_deref(), Some("Numbers are attached."));
    assert_eq!(session.plain_charset.as_deref(), Some("utf-8"));
    assert_eq!(session.html_body.as_deref(), Some("<p>Numbers are attached.</p>"));
    assert_eq!(session.original_body, session.plain_body);

    assert_eq!(session.mime_parts.len(), 3);
    assert_eq!(session.attachments.len(), 1);
    let pdf = &session.attachments[0];
    assert_eq!(pdf.filename.as_deref(), Some("q1.pdf"));
    assert_eq!(pdf.content_type, "application/pdf");
    assert_eq!(pdf.content, "JVBERi0xLjQK");
}

#[test]
fn test_smtp_nested_multipart_first_plain_wins() {
    let data = "Content-Type: multipart/mixed; boundary=\"A\"\r\n\
                \r\n\
                --A\r\n\
                Content-Type: text/plain\r\n\
                \r\n\
                outer body\r\n\
                --A\r\n\
                Content-Type: multipart/mixed; boundary=\"B\"\r\n\
                \r\n\
                --B\r\n\
                Content-Type: text/plain\r\n\
                \r\n\
                inner body\r\n\
                --B\r\n\
                Content-Type: text/plain\r\n\
                Content-Disposition: attachment; filename=\"f.txt\"\r\n\
                \r\n\
                file contents\r\n\
                --B--\r\n\
                --A--\r\n";

    let session = reconstruct_smtp(&smtp_transcript(data), &StreamEndpoints::default());

    assert_eq!(session.plain_body.as_deref(), Some("outer body"));
    assert_eq!(session.attachments.len(), 1);
    assert_eq!(session.attachments[0].filename.as_deref(), Some("f.txt"));
}

#[test]
fn test_smtp_depth_cap_from_config() {
    let data = "Content-Type: multipart/mixed; boundary=\"A\"\r\n\
                \r\n\
                --A\r\n\
                Content-Type: multipart/alternative; boundary=\"B\"\r\n\
                \r\n\
                --B\r\n\
                Content-Type: text/plain\r\n\
                \r\n\
                too deep\r\n\
                --B--\r\n\
                --A--\r\n";

    let config = ReconstructConfig::default().with_max_mime_depth(1);
    let session = SmtpReconstructor::new(config, StreamEndpoints::default())
        .reconstruct(&smtp_transcript(data));

    assert!(session.mime_parts.is_empty());
    assert_eq!(session.plain_body, None);

    let session = reconstruct_smtp(&smtp_transcript(data), &StreamEndpoints::default());
    assert_eq!(session.plain_body.as_deref(), Some("too deep"));
}

#[test]
fn test_usb_header_length_discriminator() {
    let mut extended = vec![0u8; 27];
    extended[0] = 0x1B;
    extended[17] = 0x02; // Bus ID low byte
    extended[19] = 0x09; // Device address low byte
    extended[21] = 0x81; // Endpoint 1, IN
    extended[22] = transfer::INTERRUPT;

    let frame = decode_usb_frame(&extended, false).unwrap();
    assert_eq!(frame.header_format, HeaderFormat::Extended27or28);
    assert_eq!(frame.bus_id, 2);
    assert_eq!(frame.device_address, 9);
    assert_eq!(frame.endpoint_number, 1);
    assert_eq!(frame.endpoint_direction, TransferDirection::In);
    assert_eq!(frame.transfer_type, TransferType::Interrupt);

    let mut legacy = vec![0u8; 27];
    legacy[0] = 0x12;
    legacy[17] = 0x02; // Bus ID
    legacy[18] = 0x09; // Device address
    legacy[19] = 0x03; // Endpoint 3, OUT
    legacy[20] = transfer::BULK;

    let frame = decode_usb_frame(&legacy, false).unwrap();
    assert_eq!(frame.header_format, HeaderFormat::Legacy18);
    assert_eq!(frame.bus_id, 2);
    assert_eq!(frame.device_address, 9);
    assert_eq!(frame.endpoint_number, 3);
    assert_eq!(frame.endpoint_direction, TransferDirection::Out);
    assert_eq!(frame.transfer_type, TransferType::Bulk);
}

#[test]
fn test_usb_short_buffer_error() {
    let err = decode_usb_frame(&[0x1B, 0x00, 0x01], false).unwrap_err();
    assert_eq!(err, UsbError::MalformedFrame { needed: 18, have: 3 });

    let wrapped: Error = err.into();
    assert!(wrapped.to_string().contains("need at least 18 bytes"));
}

#[test]
fn test_usb_set_configuration() {
    let mut frame = vec![0u8; 28];
    frame[0] = 0x1C;
    frame[22] = transfer::CONTROL;
    frame[23] = 0x08; // Data length: setup packet only
    frame.extend_from_slice(&[
        0x00, // Host-to-device, standard, device
        0x09, // SET_CONFIGURATION
        0x01, 0x00, // wValue: configuration 1
        0x00, 0x00, // wIndex
        0x00, 0x00, // wLength
    ]);

    let decoded = decode_usb_frame(&frame, true).unwrap();
    let setup = decoded.setup_packet.unwrap();

    assert_eq!(setup.request_name, Some("SET_CONFIGURATION"));
    assert_eq!(setup.w_value, 1);
    assert_eq!(setup.descriptor_type, None);
    assert!(decoded.data_payload.is_empty());
}

#[test]
fn test_protocol_chains() {
    let https = Packet::new(1, "HTTPS")
        .with_network(4)
        .with_transport("TCP")
        .with_application("HTTPS");
    assert_eq!(build_protocol_chain(&https).to_vec(), ["IP", "TCP", "TLS", "HTTP"]);

    let arp = Packet::new(2, "ARP").with_network(6);
    assert_eq!(build_protocol_chain(&arp).to_vec(), ["ARP"]);

    let dns = Packet::new(3, "DNS")
        .with_network(6)
        .with_transport("UDP")
        .with_application("DNS");
    assert_eq!(build_protocol_chain(&dns).to_string(), "IPv6 -> UDP -> DNS");
}

#[test]
fn test_response_cache_with_reconstruction() {
    let messages = vec![
        client(10, 0.0, "GET /a HTTP/1.1\r\n\r\n"),
        server(11, 0.2, "HTTP/1.1 302 Found\r\nLocation: /b\r\n\r\n"),
    ];
    let result = reconstruct_http(&messages);
    let cache = ResponseCache::new();

    let first = cache.get_or_compute(10, || result.response_for(10).cloned());
    let second = cache.get_or_compute(10, || panic!("computed twice"));
    assert_eq!(first, second);
    assert_eq!(first.map(|r| r.status_code), Some(302));

    // New capture loaded
    cache.invalidate();
    assert!(cache.is_empty());
}

#[test]
fn test_reconstructors_are_idempotent() {
    let http = vec![
        client(1, 0.0, "GET / HTTP/1.1\r\n\r\n"),
        server(2, 0.1, "HTTP/1.1 200 OK\r\n\r\nbody"),
        server(3, 0.2, "more"),
    ];
    assert_eq!(reconstruct_http(&http), reconstruct_http(&http));

    let smtp = smtp_transcript("Subject: x\r\n\r\nhello\r\n");
    let endpoints = StreamEndpoints::default();
    assert_eq!(reconstruct_smtp(&smtp, &endpoints), reconstruct_smtp(&smtp, &endpoints));

    let frame = [0u8; 18];
    assert_eq!(decode_usb_frame(&frame, false), decode_usb_frame(&frame, false));

    let packet = Packet::new(1, "HTTPS");
    assert_eq!(build_protocol_chain(&packet), build_protocol_chain(&packet));
}
