//! Message header invariants over every configured size.

use amp_latency::message::{prepare, validate_echo, MessageHeader, HEADER_SIZE};
use amp_latency::{geometric_sizes, ErrorKind, ProbeError};
use proptest::prelude::*;

fn arb_size() -> impl Strategy<Value = usize> {
    prop::sample::select(geometric_sizes(16, 1024))
}

proptest! {
    #[test]
    fn prepared_length_excludes_header(size in arb_size(), index in 1u32..=1000, fill in any::<u8>()) {
        let mut buf = vec![fill; 1024];
        prepare(&mut buf, index, size);

        let header = MessageHeader::decode(&buf);
        prop_assert_eq!(header.index, index);
        prop_assert_eq!(header.len as usize, size - HEADER_SIZE);
        prop_assert_eq!(header.total_size(), size);
        prop_assert!(buf[HEADER_SIZE..].iter().all(|&b| b == fill));
    }

    #[test]
    fn unmodified_echo_validates(size in arb_size(), index in 1u32..=1000) {
        let mut buf = vec![0x0A; size];
        prepare(&mut buf, index, size);
        let echoed = buf.clone();
        prop_assert!(validate_echo(&echoed, size, index).is_ok());
    }

    #[test]
    fn corrupted_length_is_a_protocol_violation(
        size in arb_size(),
        index in 1u32..=1000,
        len in any::<u32>(),
    ) {
        prop_assume!(len as usize != size - HEADER_SIZE);
        let mut buf = vec![0x0A; size];
        prepare(&mut buf, index, size);
        MessageHeader { index, len }.encode(&mut buf);

        let err = validate_echo(&buf, size, index).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::Protocol);
        match err {
            ProbeError::Protocol { expected, actual, iteration, .. } => {
                prop_assert_eq!(expected, size);
                prop_assert_eq!(actual, len as usize + HEADER_SIZE);
                prop_assert_eq!(iteration, index);
            }
            other => prop_assert!(false, "unexpected error {other:?}"),
        }
    }
}
