//! Integration tests for the capture pipeline
//!
//! Tests the complete flow: WAV reading -> mu-law encoding -> RTP
//! packetization -> Ethernet/IPv4/UDP framing -> pcap file, then reads the
//! file back with a minimal pcap parser written here against the format.

use std::fs;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use pcapgen::{
    generate_capture, read_wav, write_capture_file, MetricsContext, PcapGenError, PipelineConfig,
    TailPolicy, Waveform,
};

/// One record parsed from a pcap file.
struct Record {
    ts_sec: u32,
    ts_usec: u32,
    data: Vec<u8>,
}

/// Minimal little-endian pcap reader.
fn parse_pcap(bytes: &[u8]) -> (Vec<u8>, Vec<Record>) {
    // ---
    assert!(bytes.len() >= 24, "missing global header");
    let header = bytes[..24].to_vec();

    let mut records = Vec::new();
    let mut pos = 24;
    while pos < bytes.len() {
        let field = |off: usize| u32::from_le_bytes(bytes[pos + off..pos + off + 4].try_into().unwrap());
        let ts_sec = field(0);
        let ts_usec = field(4);
        let incl_len = field(8) as usize;
        let orig_len = field(12) as usize;
        assert_eq!(incl_len, orig_len, "record truncated");

        pos += 16;
        assert!(pos + incl_len <= bytes.len(), "record body runs past end of file");
        records.push(Record {
            ts_sec,
            ts_usec,
            data: bytes[pos..pos + incl_len].to_vec(),
        });
        pos += incl_len;
    }

    (header, records)
}

fn be16(b: &[u8], off: usize) -> u16 {
    u16::from_be_bytes([b[off], b[off + 1]])
}

fn be32(b: &[u8], off: usize) -> u32 {
    u32::from_be_bytes([b[off], b[off + 1], b[off + 2], b[off + 3]])
}

/// RFC 1071 checksum verification: the header sums to 0xFFFF.
fn ipv4_header_valid(ip: &[u8]) -> bool {
    // ---
    let mut sum: u32 = ip.chunks(2).map(|w| u32::from(u16::from_be_bytes([w[0], w[1]]))).sum();
    while sum > 0xFFFF {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum == 0xFFFF
}

/// Returns the UDP payload of an Ethernet/IPv4/UDP frame.
fn udp_payload(frame: &[u8]) -> &[u8] {
    // ---
    assert_eq!(be16(frame, 12), 0x0800, "not IPv4");
    let ihl = (frame[14] & 0x0F) as usize * 4;
    assert_eq!(frame[14 + 9], 17, "not UDP");
    let udp = &frame[14 + ihl..];
    let udp_len = be16(udp, 4) as usize;
    &udp[8..udp_len]
}

fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
    // ---
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).expect("create wav");
    for &s in samples {
        writer.write_sample(s).expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}

fn metrics() -> MetricsContext {
    MetricsContext::new("test").expect("metrics init")
}

fn run(waveform: &Waveform, config: &PipelineConfig) -> Vec<u8> {
    // ---
    let mut out = Vec::new();
    generate_capture(waveform, config, &mut out, &metrics()).expect("pipeline run");
    out
}

/// Test the one-second silence scenario end to end
#[test]
fn test_one_second_of_silence() {
    // ---
    let waveform = Waveform::mono(vec![0.0; 8000], 8000).expect("valid waveform");
    let (header, records) = parse_pcap(&run(&waveform, &PipelineConfig::default()));

    assert_eq!(&header[0..4], &[0xd4, 0xc3, 0xb2, 0xa1]);
    assert_eq!(records.len(), 50);

    let first = udp_payload(&records[0].data);
    assert_eq!(be16(first, 2), 0);
    assert_eq!(be32(first, 4), 0);

    let last = udp_payload(&records[49].data);
    assert_eq!(be16(last, 2), 49);
    assert_eq!(be32(last, 4), 7840);

    // Silence encodes to 0xFF
    assert!(first[12..].iter().all(|&b| b == 0xFF));
}

/// Test that an empty waveform yields only the global header
#[test]
fn test_empty_waveform() {
    // ---
    let waveform = Waveform::mono(vec![], 8000).expect("valid waveform");
    let out = run(&waveform, &PipelineConfig::default());

    assert_eq!(out.len(), 24);
}

/// Test that 161 samples produce one packet
#[test]
fn test_trailing_sample_dropped() {
    // ---
    let samples: Vec<f32> = (0..161).map(|i| i as f32 / 161.0).collect();
    let waveform = Waveform::mono(samples.clone(), 8000).expect("valid waveform");
    let (_, records) = parse_pcap(&run(&waveform, &PipelineConfig::default()));

    assert_eq!(records.len(), 1);
    let payload = &udp_payload(&records[0].data)[12..];
    assert_eq!(payload, pcapgen::codec::encode(&samples[..160]).as_slice());
}

/// Test packet count for assorted lengths
#[test]
fn test_packet_count_is_floor_of_length() {
    // ---
    for n in [0usize, 1, 159, 160, 319, 320, 321, 1000] {
        let waveform = Waveform::mono(vec![0.25; n], 8000).expect("valid waveform");
        let (_, records) = parse_pcap(&run(&waveform, &PipelineConfig::default()));
        assert_eq!(records.len(), n / 160, "n = {n}");
    }
}

/// Test that 16 kHz input is rejected before anything is written
#[test]
fn test_wideband_input_rejected() {
    // ---
    let dir = tempfile::tempdir().expect("tempdir");
    let wav = dir.path().join("wideband.wav");
    write_wav(&wav, 16000, 1, &[0; 16000]);

    let err = read_wav(&wav).unwrap_err();
    let typed = err.downcast_ref::<PcapGenError>().expect("typed error");
    assert!(typed.is_invalid_input());
}

/// Test headers and checksums of every frame in a file-backed run
#[test]
fn test_file_round_trip_from_wav() {
    // ---
    let dir = tempfile::tempdir().expect("tempdir");
    let wav = dir.path().join("tone.wav");
    let pcap = dir.path().join("voice.pcap");

    // 440 Hz tone, 0.5 s, stereo with a silent right channel
    let mut samples = Vec::new();
    for i in 0..4000 {
        let v = (i as f32 * 2.0 * std::f32::consts::PI * 440.0 / 8000.0).sin();
        samples.push((v * 12000.0) as i16);
        samples.push(0);
    }
    write_wav(&wav, 8000, 2, &samples);

    let config = PipelineConfig {
        initial_sequence: 1000,
        ssrc: 0xCAFEBABE,
        start_time: 1_700_000_000,
        ..PipelineConfig::default()
    };
    let waveform = read_wav(&wav).expect("read wav");
    let summary = write_capture_file(&pcap, &waveform, &config, &metrics()).expect("write pcap");
    assert_eq!(summary.frames_written, 25);

    let bytes = fs::read(&pcap).expect("read pcap");
    assert_eq!(summary.bytes_written, bytes.len() as u64);

    let (header, records) = parse_pcap(&bytes);
    assert_eq!(u16::from_le_bytes([header[4], header[5]]), 2);
    assert_eq!(u16::from_le_bytes([header[6], header[7]]), 4);
    assert!(u32::from_le_bytes(header[16..20].try_into().unwrap()) >= 65535);
    assert_eq!(u32::from_le_bytes(header[20..24].try_into().unwrap()), 1);
    assert_eq!(records.len(), 25);

    let left: Vec<f32> = samples.iter().step_by(2).map(|&s| s as f32 / 32768.0).collect();
    let encoded = pcapgen::codec::encode(&left);

    let mut prev_ts = (0u32, 0u32);
    for (i, record) in records.iter().enumerate() {
        let frame = &record.data;

        // Ethernet
        assert_eq!(&frame[0..6], &[0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb]);
        assert_eq!(&frame[6..12], &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);

        // IPv4
        let ip = &frame[14..34];
        assert!(ipv4_header_valid(ip), "bad IPv4 checksum in frame {i}");
        assert_eq!(be16(ip, 2) as usize, frame.len() - 14);
        assert_eq!(&ip[12..16], &[127, 0, 0, 1]);
        assert_eq!(&ip[16..20], &[127, 0, 0, 1]);

        // UDP
        assert_eq!(be16(frame, 34), 4000);
        assert_eq!(be16(frame, 36), 4002);

        // RTP
        let rtp = udp_payload(frame);
        assert_eq!(rtp.len(), 12 + 160);
        assert_eq!(rtp[0], 0x80);
        assert_eq!(rtp[1], 0x00);
        assert_eq!(be16(rtp, 2), 1000 + i as u16);
        assert_eq!(be32(rtp, 4), i as u32 * 160);
        assert_eq!(be32(rtp, 8), 0xCAFEBABE);
        assert_eq!(&rtp[12..], &encoded[i * 160..(i + 1) * 160]);

        // Capture time
        let ts = (record.ts_sec, record.ts_usec);
        assert!(ts >= prev_ts, "timestamps went backwards at frame {i}");
        assert!(record.ts_usec < 1_000_000);
        prev_ts = ts;
    }

    assert_eq!((records[0].ts_sec, records[0].ts_usec), (1_700_000_000, 0));
    assert_eq!((records[24].ts_sec, records[24].ts_usec), (1_700_000_000, 480_000));
}

/// Test sequence wraparound through a full file
#[test]
fn test_sequence_wraps_in_capture() {
    // ---
    let config = PipelineConfig {
        initial_sequence: 65535,
        ..PipelineConfig::default()
    };
    let waveform = Waveform::mono(vec![0.0; 480], 8000).expect("valid waveform");
    let (_, records) = parse_pcap(&run(&waveform, &config));

    let seqs: Vec<u16> = records.iter().map(|r| be16(udp_payload(&r.data), 2)).collect();
    assert_eq!(seqs, vec![65535, 0, 1]);
}

/// Test the padding tail policy end to end
#[test]
fn test_pad_tail_policy() {
    // ---
    let config = PipelineConfig {
        tail_policy: TailPolicy::PadWithSilence,
        ..PipelineConfig::default()
    };
    let waveform = Waveform::mono(vec![-1.0; 161], 8000).expect("valid waveform");
    let (_, records) = parse_pcap(&run(&waveform, &config));

    assert_eq!(records.len(), 2);
    let tail = &udp_payload(&records[1].data)[12..];
    assert_eq!(tail[0], 0x00);
    assert!(tail[1..].iter().all(|&b| b == 0xFF));
}

/// Test that a config file drives the header values
#[test]
fn test_config_file_applies_to_frames() {
    // ---
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg_path = dir.path().join("pcapgen.toml");
    fs::write(
        &cfg_path,
        "src_ip = \"10.1.1.1\"\ndst_ip = \"10.2.2.2\"\nsrc_port = 7000\ndst_port = 7002\nip_ttl = 32\n",
    )
    .expect("write config");

    let config = PipelineConfig::load(&cfg_path).expect("load config");
    let waveform = Waveform::mono(vec![0.0; 160], 8000).expect("valid waveform");
    let (_, records) = parse_pcap(&run(&waveform, &config));

    let frame = &records[0].data;
    let ip = &frame[14..34];
    assert!(ipv4_header_valid(ip));
    assert_eq!(ip[8], 32);
    assert_eq!(&ip[12..16], &[10, 1, 1, 1]);
    assert_eq!(&ip[16..20], &[10, 2, 2, 2]);
    assert_eq!(be16(frame, 34), 7000);
    assert_eq!(be16(frame, 36), 7002);
}
