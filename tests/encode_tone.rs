use tone_encode::encoder::{Encoder, EncoderConfig};
use tone_encode::format::ChannelLayout;
use tone_encode::ogg_opus::{OggOpusSink, OpusHead};
use tone_encode::opus_encoder::{OpusEncoder, OPUS_ENCODER_FRAME_SIZE};
use tone_encode::pipeline::encode_tone;
use tone_encode::sink::RawSink;
use tone_encode::tone::ToneConfig;

const SAMPLE_RATE: usize = 48000;

fn opus_encoder() -> anyhow::Result<OpusEncoder> {
    Ok(OpusEncoder::new(EncoderConfig::for_layouts(OpusEncoder::SUPPORTED_LAYOUTS))?)
}

/// Frequency estimate from the zero crossings of one channel.
fn zero_crossing_hz(pcm: &[i16]) -> f64 {
    let crossings = pcm.windows(2).filter(|w| (w[0] < 0) != (w[1] < 0)).count();
    crossings as f64 / 2. / (pcm.len() as f64 / SAMPLE_RATE as f64)
}

#[test]
fn raw_stream_is_the_packet_concatenation() -> anyhow::Result<()> {
    let tone = ToneConfig::default();
    let encoded = encode_tone(&tone, opus_encoder()?, RawSink::new(Vec::new()))?;
    // 48000 samples in 960 sample frames, plus the packet pushed out by the flush.
    assert_eq!(encoded.stats.frames_submitted, 50);
    assert_eq!(encoded.stats.flush_submits, 1);
    assert_eq!(encoded.stats.packets_written, 51);
    assert!(!encoded.output.is_empty());
    assert_eq!(encoded.output.len() as u64, encoded.stats.bytes_written);

    let again = encode_tone(&tone, opus_encoder()?, RawSink::new(Vec::new()))?;
    assert_eq!(again.output, encoded.output);
    Ok(())
}

#[test]
fn ogg_stream_decodes_back_to_the_tone() -> anyhow::Result<()> {
    let encoder = opus_encoder()?;
    assert_eq!(encoder.config().layout, ChannelLayout::Stereo);
    let pre_skip = encoder.pre_skip()?;
    let head = OpusHead::new(2, pre_skip, SAMPLE_RATE as u32);
    let sink = OggOpusSink::new(Vec::new(), &head)?.with_length(SAMPLE_RATE as u64);
    let encoded = encode_tone(&ToneConfig::default(), encoder, sink)?;

    let mut reader = ogg::PacketReader::new(std::io::Cursor::new(encoded.output));
    let head_packet = reader.read_packet()?.expect("missing opus head");
    assert_eq!(OpusHead::from_slice(&head_packet.data)?, head);
    let tags = reader.read_packet()?.expect("missing opus tags");
    assert!(tags.data.starts_with(b"OpusTags"));

    let mut decoder = opus::Decoder::new(SAMPLE_RATE as u32, opus::Channels::Stereo)?;
    let mut buf = vec![0i16; 5760 * 2];
    let mut left = vec![];
    let mut right = vec![];
    let mut last_granule = 0;
    while let Some(packet) = reader.read_packet()? {
        last_granule = packet.absgp_page();
        let n = decoder.decode(&packet.data, &mut buf, false)?;
        assert_eq!(n, OPUS_ENCODER_FRAME_SIZE);
        for frame in buf[..2 * n].chunks_exact(2) {
            left.push(frame[0]);
            right.push(frame[1]);
        }
    }

    // The silence pushed out by the flush is trimmed by the last granule.
    assert_eq!(last_granule, pre_skip as u64 + SAMPLE_RATE as u64);
    let audio = &left[pre_skip as usize..];
    assert!(audio.len() >= SAMPLE_RATE, "decoded {} samples", audio.len());

    // The chirp starts at 440Hz and sweeps upwards, over 20ms..70ms it averages
    // around 520Hz.
    let window = &audio[960..3360];
    let hz = zero_crossing_hz(window);
    assert!((420. ..650.).contains(&hz), "estimated {hz} Hz");
    let peak = window.iter().map(|v| v.unsigned_abs()).max().unwrap_or(0);
    assert!((7000..13000).contains(&peak), "peak {peak}");

    // Both channels carry the same signal.
    let diff: i64 = left.iter().zip(right.iter()).map(|(l, r)| (*l as i64 - *r as i64).abs()).sum();
    assert!(diff / (left.len() as i64) < 200, "mean channel difference {}", diff / left.len() as i64);
    Ok(())
}

#[test]
fn generated_start_frequency() -> anyhow::Result<()> {
    use tone_encode::frame::AudioFrame;
    use tone_encode::tone::ToneGenerator;

    let tone = ToneConfig::default();
    let mut generator = ToneGenerator::new(&tone, SAMPLE_RATE as u32, 2400)?;
    let mut frame = AudioFrame::for_encoder(&EncoderConfig::default(), 2400)?;
    assert!(generator.fill_next(&mut frame)?);
    let samples = frame.samples();
    let left: Vec<i16> = (0..samples.len()).map(|i| samples.get(i, 0)).collect();
    // First 50ms sweep from 440Hz to 528Hz.
    let hz = zero_crossing_hz(&left);
    assert!((430. ..540.).contains(&hz), "estimated {hz} Hz");
    Ok(())
}
