//! End-to-end round-trips through the encode/ -> decode/ pipeline: build a
//! track with [`fluxfox::encode`], then recover it with
//! [`fluxfox::decode::decode_track`] and check the sectors come back intact.

use fluxfox::bitbuffer::BitBuffer;
use fluxfox::chs::Header;
use fluxfox::decode::decode_track;
use fluxfox::encode::bitstream_buffer::BitstreamTrackBuffer;
use fluxfox::encode::TrackBuffer;
use fluxfox::sector::{DataRate, Encoding};

fn encode_one_mfm_sector(header: Header, payload: &[u8], bad_crc: bool) -> BitBuffer {
    let mut tb = BitstreamTrackBuffer::new(Encoding::Mfm, DataRate::Rate250Kbps);
    tb.add_track_start();
    tb.add_sector(&header, payload, 0x54, false, bad_crc);
    tb.into_buffer()
}

#[test]
fn mfm_sector_round_trips_through_encode_and_decode() {
    let header = Header::new(0, 0, 1, 2);
    let payload: Vec<u8> = (0..512u32).map(|i| (i % 251) as u8).collect();
    let bits = encode_one_mfm_sector(header, &payload, false);

    let track = decode_track(&bits, DataRate::Rate250Kbps, Encoding::Mfm);
    assert_eq!(track.len(), 1);
    let sector = &track.sectors()[0];
    assert!(!sector.bad_id_crc);
    assert!(!sector.bad_data_crc);
    assert_eq!(sector.data(), Some(payload.as_slice()));
}

#[test]
fn corrupted_data_crc_is_flagged_without_failing_the_id_field() {
    let header = Header::new(2, 1, 5, 2);
    let payload = vec![0xAAu8; 512];
    let bits = encode_one_mfm_sector(header, &payload, true);

    let track = decode_track(&bits, DataRate::Rate250Kbps, Encoding::Mfm);
    assert_eq!(track.len(), 1);
    let sector = &track.sectors()[0];
    assert!(!sector.bad_id_crc);
    assert!(sector.bad_data_crc);
}

#[test]
fn two_sectors_on_one_track_decode_in_order() {
    let mut tb = BitstreamTrackBuffer::new(Encoding::Mfm, DataRate::Rate250Kbps);
    tb.add_track_start();
    for (id, header) in [(1u8, Header::new(0, 0, 1, 2)), (2u8, Header::new(0, 0, 2, 2))] {
        let payload = vec![id; 512];
        tb.add_sector(&header, &payload, 0x54, false, false);
    }

    let track = decode_track(&tb.into_buffer(), DataRate::Rate250Kbps, Encoding::Mfm);
    assert_eq!(track.len(), 2);
    assert_eq!(track.sectors()[0].data(), Some([1u8; 512].as_slice()));
    assert_eq!(track.sectors()[1].data(), Some([2u8; 512].as_slice()));
}

#[test]
fn short_payload_is_zero_padded_to_the_sectors_natural_size() {
    let header = Header::new(0, 0, 1, 2);
    let payload = vec![0x7Eu8; 100];
    let bits = encode_one_mfm_sector(header, &payload, false);

    let track = decode_track(&bits, DataRate::Rate250Kbps, Encoding::Mfm);
    let sector = &track.sectors()[0];
    assert!(!sector.bad_data_crc);
    let decoded = sector.data().unwrap();
    assert_eq!(decoded.len(), 512);
    assert_eq!(&decoded[..100], payload.as_slice());
    assert!(decoded[100..].iter().all(|&b| b == 0));
}

#[test]
fn deleted_sector_is_encoded_with_the_deleted_dam() {
    let header = Header::new(0, 0, 1, 2);
    let payload = vec![0x11u8; 512];
    let mut tb = BitstreamTrackBuffer::new(Encoding::Mfm, DataRate::Rate250Kbps);
    tb.add_track_start();
    tb.add_sector(&header, &payload, 0x54, true, false);

    let track = decode_track(&tb.into_buffer(), DataRate::Rate250Kbps, Encoding::Mfm);
    let sector = &track.sectors()[0];
    assert_eq!(sector.dam, fluxfox::sector::Dam::DeletedF8);
}
