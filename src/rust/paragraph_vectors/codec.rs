//! Binary model format.
//!
//! ```text
//! magic    "LWPV"
//! version  u32
//! sha256   [u8; 32] over the payload
//! length   u64 payload byte count
//! payload  config, vocabulary, labels, dimension, token matrix, reference matrix
//! ```
//!
//! All integers and floats are little-endian. Floats are stored bit-exact so a
//! restored model scores identically to the one that was persisted.

use ndarray::Array2;
use sha2::{Digest, Sha256};

use super::model::EmbeddingModel;
use super::vocab::Vocabulary;
use super::TrainingConfig;
use crate::classifier::{LoadFailure, TextEmbedding};
use crate::corpus::LabelSet;

const MAGIC: &[u8; 4] = b"LWPV";
pub(crate) const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 32 + 8;

pub(crate) fn encode(model: &EmbeddingModel) -> Vec<u8> {
    let mut payload = Writer::default();

    let config = model.config();
    payload.f32(config.learning_rate);
    payload.f32(config.min_learning_rate);
    payload.u64(config.batch_size as u64);
    payload.u64(config.epochs as u64);
    payload.u8(config.train_word_vectors as u8);
    payload.u64(config.layer_size as u64);
    payload.u64(config.window_size as u64);
    payload.u64(config.negative_samples as u64);
    payload.u64(config.min_word_frequency);
    payload.u64(config.seed);

    let vocab = model.vocab();
    payload.u64(vocab.len() as u64);
    for (word, count) in vocab.words().iter().zip(vocab.counts()) {
        payload.str(word);
        payload.u64(*count);
    }

    let labels = model.labels();
    payload.u64(labels.len() as u64);
    for label in labels {
        payload.str(label);
    }

    payload.u64(model.dimension() as u64);
    payload.matrix(model.token_vectors());
    payload.matrix(model.reference_matrix());

    let payload = payload.into_inner();
    let digest = Sha256::digest(&payload);

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&digest);
    out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    out.extend_from_slice(&payload);
    out
}

pub(crate) fn decode(bytes: &[u8]) -> Result<EmbeddingModel, LoadFailure> {
    let mut header = Reader::new(bytes);
    if header.take(4)? != MAGIC {
        return Err(LoadFailure::Corrupt("not a labelwise model file".into()));
    }
    let version = header.u32()?;
    if version != FORMAT_VERSION {
        return Err(LoadFailure::UnsupportedVersion(version));
    }
    let expected = hex(header.take(32)?);
    let length = header.len_u64()?;
    let payload = header.take(length)?;
    header.finish()?;

    let actual = hex(&Sha256::digest(payload));
    if actual != expected {
        return Err(LoadFailure::ChecksumMismatch { expected, actual });
    }

    let mut r = Reader::new(payload);
    let config = TrainingConfig {
        learning_rate: r.f32()?,
        min_learning_rate: r.f32()?,
        batch_size: r.len_u64()?,
        epochs: r.len_u64()?,
        train_word_vectors: r.u8()? != 0,
        layer_size: r.len_u64()?,
        window_size: r.len_u64()?,
        negative_samples: r.len_u64()?,
        min_word_frequency: r.u64()?,
        seed: r.u64()?,
    };

    let vocab_len = r.len_u64()?;
    let mut entries = Vec::with_capacity(vocab_len.min(r.remaining()));
    for _ in 0..vocab_len {
        let word = r.string()?;
        let count = r.u64()?;
        entries.push((word, count));
    }
    let vocab = Vocabulary::from_entries(entries);
    if vocab.len() != vocab_len {
        return Err(LoadFailure::Corrupt("duplicate vocabulary entries".into()));
    }

    let label_len = r.len_u64()?;
    let mut labels = LabelSet::new();
    for _ in 0..label_len {
        if !labels.insert(r.string()?) {
            return Err(LoadFailure::Corrupt("duplicate label".into()));
        }
    }

    let dim = r.len_u64()?;
    let token_vectors = r.matrix(vocab_len, dim)?;
    let reference_vectors = r.matrix(label_len, dim)?;
    r.finish()?;

    Ok(EmbeddingModel::new(
        config,
        vocab,
        token_vectors,
        labels,
        reference_vectors,
    ))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[derive(Default)]
struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn str(&mut self, s: &str) {
        self.u64(s.len() as u64);
        self.buf.extend_from_slice(s.as_bytes());
    }

    fn matrix(&mut self, m: &Array2<f32>) {
        for v in m.iter() {
            self.f32(*v);
        }
    }

    fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], LoadFailure> {
        if n > self.remaining() {
            return Err(LoadFailure::Corrupt(format!(
                "truncated at byte {}: need {} more, have {}",
                self.pos,
                n,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], LoadFailure> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, LoadFailure> {
        Ok(self.array::<1>()?[0])
    }

    fn u32(&mut self) -> Result<u32, LoadFailure> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64, LoadFailure> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    /// A u64 that must fit in `usize`
    fn len_u64(&mut self) -> Result<usize, LoadFailure> {
        let v = self.u64()?;
        usize::try_from(v).map_err(|_| LoadFailure::Corrupt(format!("length {} out of range", v)))
    }

    fn f32(&mut self) -> Result<f32, LoadFailure> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    fn string(&mut self) -> Result<String, LoadFailure> {
        let len = self.len_u64()?;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| LoadFailure::Corrupt(format!("invalid UTF-8 string: {}", e)))
    }

    fn matrix(&mut self, rows: usize, cols: usize) -> Result<Array2<f32>, LoadFailure> {
        let count = rows
            .checked_mul(cols)
            .ok_or_else(|| LoadFailure::Corrupt("matrix size overflow".into()))?;
        let byte_len = count
            .checked_mul(4)
            .ok_or_else(|| LoadFailure::Corrupt("matrix size overflow".into()))?;
        let raw = self.take(byte_len)?;
        let values: Vec<f32> = raw
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Array2::from_shape_vec((rows, cols), values)
            .map_err(|e| LoadFailure::Corrupt(format!("bad matrix shape: {}", e)))
    }

    fn finish(&self) -> Result<(), LoadFailure> {
        if self.remaining() != 0 {
            return Err(LoadFailure::Corrupt(format!(
                "{} trailing bytes",
                self.remaining()
            )));
        }
        Ok(())
    }
}
