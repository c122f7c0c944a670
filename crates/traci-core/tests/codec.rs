//! Strict decoding and framing behavior.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use bytes::{Bytes, BytesMut};

use traci_core::error::{ErrorKind, ResultCode, TraciError};
use traci_core::protocol::{
    encode_message, split_commands, try_split_message, write_command, Color, Reader, Status,
    Storage, TypedValue, ValueType,
};

fn encoded(v: &TypedValue) -> Bytes {
    let mut s = Storage::new();
    v.encode(&mut s).unwrap();
    s.freeze()
}

#[test]
fn strict_read_rejects_other_tag() {
    let mut r = Reader::new(encoded(&TypedValue::Int(7)));
    let err = r.read_typed_double().expect_err("int is not a double");
    assert!(matches!(err, TraciError::TypeMismatch { expected: 0x0b, found: 0x09 }));
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn decode_as_leaves_cursor_on_mismatch() {
    let mut r = Reader::new(encoded(&TypedValue::String("x".into())));
    assert!(TypedValue::decode_as(ValueType::Int, &mut r).is_err());
    assert_eq!(r.consumed(), 0);
    let v = TypedValue::decode_as(ValueType::String, &mut r).unwrap();
    assert_eq!(v, TypedValue::String("x".into()));
}

#[test]
fn compound_keeps_count_order_and_types() {
    let items = vec![
        TypedValue::String("edge".into()),
        TypedValue::Double(12.5),
        TypedValue::Byte(-1),
        TypedValue::Int(3000),
        TypedValue::Color(Color::new(1, 2, 3, 4)),
        TypedValue::StringList(vec!["a".into(), "b".into()]),
        TypedValue::Compound(vec![TypedValue::UByte(9)]),
    ];
    let mut r = Reader::new(encoded(&TypedValue::Compound(items.clone())));

    assert_eq!(r.read_compound_header().unwrap(), items.len());
    let mut back = Vec::new();
    for _ in 0..items.len() {
        back.push(TypedValue::decode(&mut r).unwrap());
    }
    assert_eq!(back, items);
    assert!(r.is_empty());
}

#[test]
fn doubles_are_big_endian_ieee754() {
    let bytes = encoded(&TypedValue::Double(-1_073_741_824.0));
    assert_eq!(bytes.as_ref(), &[0x0b, 0xc1, 0xd0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn message_waits_for_fragmented_stream() {
    let mut body = Storage::new();
    write_command(&mut body, 0xa4, &[0x40, 0, 0, 0, 1, b'v']).unwrap();
    write_command(&mut body, 0x00, &[]).unwrap();
    let msg = encode_message(body.as_slice()).unwrap();

    let mut buf = BytesMut::new();
    let mut got = None;
    for b in msg.iter() {
        assert!(got.is_none(), "message completed early");
        buf.extend_from_slice(&[*b]);
        got = try_split_message(&mut buf, 1 << 20).unwrap();
    }
    let got = got.expect("complete message");
    assert!(buf.is_empty());

    let cmds: Vec<_> = split_commands(got).collect::<Result<_, _>>().unwrap();
    assert_eq!(cmds.len(), 2);
    assert_eq!(cmds[0].id, 0xa4);
    assert_eq!(cmds[0].body.as_ref(), &[0x40, 0, 0, 0, 1, b'v']);
    assert_eq!(cmds[1].id, 0x00);
    assert!(cmds[1].body.is_empty());
}

#[test]
fn back_to_back_messages_split_cleanly() {
    let mut one = Storage::new();
    write_command(&mut one, 0x7f, &[]).unwrap();
    let first = encode_message(one.as_slice()).unwrap();
    let second = encode_message(one.as_slice()).unwrap();

    let mut buf = BytesMut::new();
    buf.extend_from_slice(&first);
    buf.extend_from_slice(&second[..3]);
    assert!(try_split_message(&mut buf, 1024).unwrap().is_some());
    assert!(try_split_message(&mut buf, 1024).unwrap().is_none());
    buf.extend_from_slice(&second[3..]);
    assert!(try_split_message(&mut buf, 1024).unwrap().is_some());
}

#[test]
fn oversized_and_negative_lengths_are_protocol_errors() {
    let mut buf = BytesMut::from(&[0x7f, 0xff, 0xff, 0xff][..]);
    assert_eq!(try_split_message(&mut buf, 1024).unwrap_err().kind(), ErrorKind::Protocol);
    let mut buf = BytesMut::from(&[0xff, 0xff, 0xff, 0xfe][..]);
    assert_eq!(try_split_message(&mut buf, 1024).unwrap_err().kind(), ErrorKind::Protocol);
}

#[test]
fn long_commands_use_extended_header() {
    let content = vec![0xabu8; 300];
    let mut out = Storage::new();
    write_command(&mut out, 0xc4, &content).unwrap();
    let raw = out.freeze();
    assert_eq!(raw[0], 0);
    assert_eq!(&raw[1..5], &(306i32).to_be_bytes());

    let cmds: Vec<_> = split_commands(raw).collect::<Result<_, _>>().unwrap();
    assert_eq!(cmds[0].id, 0xc4);
    assert_eq!(cmds[0].body.len(), 300);
}

#[test]
fn length_prefix_beyond_i32_is_an_internal_error() {
    let mut out = Storage::new();
    out.write_u8(7);
    let err = out.write_len(i32::MAX as usize + 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(out.as_slice(), &[7]);

    out.write_len(i32::MAX as usize).unwrap();
    assert_eq!(&out.as_slice()[1..], &i32::MAX.to_be_bytes());
}

#[test]
fn bad_command_length_stops_iteration() {
    // declared 9 bytes, only 3 present; the following bytes must not be parsed
    let body = Bytes::from_static(&[9, 0xa4, 0x40, 2, 0x7f]);
    let mut it = split_commands(body);
    assert_eq!(it.next().unwrap().unwrap_err().kind(), ErrorKind::Protocol);
    assert!(it.next().is_none());
}

#[test]
fn status_round_trip() {
    let err = TraciError::validation("Vehicle 'x' is not known");
    let mut out = Storage::new();
    Status::error(0xa4, &err).encode(&mut out).unwrap();
    let cmd = split_commands(out.freeze()).next().unwrap().unwrap();
    let st = Status::parse(&cmd).unwrap();
    assert_eq!(st.command_id, 0xa4);
    assert_eq!(st.result, ResultCode::Error);
    assert_eq!(st.description, "Vehicle 'x' is not known");
}
