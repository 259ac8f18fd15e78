use std::{
    fs::File,
    io::{Seek, Write},
    path::Path,
};

use hound::{SampleFormat, WavSpec, WavWriter};
use symphonia::core::{
    audio::SampleBuffer,
    codecs::{DecoderOptions, CODEC_TYPE_NULL},
    errors::Error as SymphoniaError,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
};
use symphonia::default::{get_codecs, get_probe};
use tracing::{debug, warn};

use crate::{
    core::dsp::{resample_stereo, to_planar_stereo},
    error::{Result, SplitError},
    types::{AudioBuffer, AudioData, TARGET_SAMPLE_RATE},
};

/// Decodes the first audio track of `path` into interleaved f32 samples.
pub fn read_audio<P: AsRef<Path>>(path: P) -> Result<AudioData> {
    let path: &Path = path.as_ref();

    let file = File::open(path).map_err(|e| SplitError::decode(path, e))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| SplitError::decode(path, e))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| SplitError::decode(path, "no audio track found"))?;
    let track_id = track.id;

    let mut decoder = get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| SplitError::decode(path, e))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_rate: u32 = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels: u16 = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(0);

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(SplitError::decode(path, e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // a corrupt packet is skipped, the rest of the stream may still be usable
            Err(SymphoniaError::DecodeError(e)) => {
                warn!(path = %path.display(), "skipping undecodable packet: {e}");
                continue;
            }
            Err(e) => return Err(SplitError::decode(path, e)),
        };

        sample_rate = decoded.spec().rate;
        channels = decoded.spec().channels.count() as u16;

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        buffer.copy_interleaved_ref(decoded);

        samples.extend_from_slice(buffer.samples());
    }

    if samples.is_empty() || channels == 0 {
        return Err(SplitError::decode(path, "no audio samples decoded"));
    }

    debug!(
        path = %path.display(),
        sample_rate,
        channels,
        samples = samples.len(),
        "read audio"
    );

    Ok(AudioData {
        samples,
        sample_rate,
        channels,
    })
}

/// Loads `path` as a stereo buffer at 44.1 kHz.
pub fn load_stereo<P: AsRef<Path>>(path: P) -> Result<AudioBuffer> {
    let path = path.as_ref();
    let audio = read_audio(path)?;
    let frames = to_planar_stereo(&audio.samples, audio.channels);

    let frames = if audio.sample_rate != TARGET_SAMPLE_RATE {
        debug!(from = audio.sample_rate, to = TARGET_SAMPLE_RATE, "resampling");
        resample_stereo(&frames, audio.sample_rate, TARGET_SAMPLE_RATE)
            .map_err(|e| SplitError::decode(path, e))?
    } else {
        frames
    };

    Ok(AudioBuffer::from_frames(&frames, TARGET_SAMPLE_RATE))
}

fn wav_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Encodes `audio` as 16-bit stereo PCM into any seekable sink.
pub fn encode_wav<W: Write + Seek>(sink: W, audio: &AudioBuffer) -> Result<()> {
    let mut writer = WavWriter::new(sink, wav_spec(audio.sample_rate))
        .map_err(|e| SplitError::Anyhow(e.into()))?;
    for &sample in audio.samples.iter() {
        let s = (sample * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        writer
            .write_sample(s)
            .map_err(|e| SplitError::Anyhow(e.into()))?;
    }
    writer.finalize().map_err(|e| SplitError::Anyhow(e.into()))?;
    Ok(())
}

pub fn write_audio<P: AsRef<Path>>(path: P, audio: &AudioBuffer) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| SplitError::write(path, e))?;
    encode_wav(std::io::BufWriter::new(file), audio).map_err(|e| SplitError::write(path, e))
}
