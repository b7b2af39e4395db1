//! Dataset preparer
//!
//! Deterministic pipeline from the raw labeled CSV to the training
//! artifacts: drop the id column, encode labels, stratified seeded split,
//! per-row text cleaning, TF-IDF fit on the training partition only,
//! persist both partitions plus the fitted vectorizer to the object
//! store, and remove the local copies (the store is the sole durable
//! owner).

use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::Config;
use crate::error::AppError;
use crate::layout;
use crate::platform::ObjectStore;
use crate::vectorizer::{self, TfidfVectorizer, MAX_FEATURES};

/// Fixed split fraction and seed; the split must be byte-for-byte
/// reproducible across runs.
pub const TEST_FRACTION: f64 = 0.2;
pub const SPLIT_SEED: u64 = 42;

/// Local staging directory, removed again after upload.
const LOCAL_ASSET_DIR: &str = "asset";

/// A raw labeled row after the id column is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub text: String,
    pub label: String,
}

/// Run the full preprocessing pipeline.
pub async fn run(store: &dyn ObjectStore, config: &Config) -> Result<(), AppError> {
    let dataset_key = format!("{}/{}", layout::DATASET_PREFIX, config.dataset_name()?);
    tracing::info!(
        "Loading dataset from s3://{}/{}",
        config.bucket_name,
        dataset_key
    );
    let raw = store.get_object(&config.bucket_name, &dataset_key).await?;
    let raw = String::from_utf8(raw)
        .map_err(|e| AppError::Dataset(format!("dataset is not valid UTF-8: {}", e)))?;

    let rows = parse_dataset(&raw)?;
    tracing::info!("Loaded {} labeled rows", rows.len());

    let labels: Vec<String> = rows.iter().map(|r| r.label.clone()).collect();
    let (classes, encoded) = encode_labels(&labels);
    tracing::info!("Label classes (encoded in this order): {:?}", classes);

    let (train_idx, test_idx) = stratified_split(&encoded, TEST_FRACTION, SPLIT_SEED);
    tracing::info!(
        "Split {} train / {} test rows (fraction {}, seed {})",
        train_idx.len(),
        test_idx.len(),
        TEST_FRACTION,
        SPLIT_SEED
    );

    let train_docs: Vec<String> = train_idx.iter().map(|&i| clean_text(&rows[i].text)).collect();
    let test_docs: Vec<String> = test_idx.iter().map(|&i| clean_text(&rows[i].text)).collect();

    // Fit on the training partition ONLY; the test partition is
    // transformed, never refit.
    let fitted = TfidfVectorizer::fit(&train_docs, MAX_FEATURES);
    tracing::info!("Fitted vectorizer with {} features", fitted.dimension());

    let train_csv = encode_partition(&fitted, &train_docs, &train_idx, &encoded);
    let test_csv = encode_partition(&fitted, &test_docs, &test_idx, &encoded);

    let artifacts = [
        ("train/train.csv", layout::TRAIN_KEY, train_csv),
        ("test/test.csv", layout::TEST_KEY, test_csv),
        (
            "artifact/tfidf_vectorizer.json",
            layout::VECTORIZER_KEY,
            String::from_utf8(fitted.to_json()?)
                .map_err(|e| AppError::Dataset(e.to_string()))?,
        ),
    ];

    for (local_name, key, contents) in &artifacts {
        let path = Path::new(LOCAL_ASSET_DIR).join(local_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::Dataset(format!("cannot create {:?}: {}", parent, e)))?;
        }
        fs::write(&path, contents)
            .map_err(|e| AppError::Dataset(format!("cannot write {:?}: {}", path, e)))?;

        store
            .put_object(&config.bucket_name, key, contents.clone().into_bytes())
            .await?;

        fs::remove_file(&path)
            .map_err(|e| AppError::Dataset(format!("cannot remove {:?}: {}", path, e)))?;
    }

    tracing::info!("All artifacts preprocessed and uploaded");
    Ok(())
}

/// Label column first, dense features after, all fixed 6-decimal.
fn encode_partition(
    fitted: &TfidfVectorizer,
    docs: &[String],
    indices: &[usize],
    encoded_labels: &[usize],
) -> String {
    let mut out = String::new();
    for (doc, &row_index) in docs.iter().zip(indices) {
        let mut record = Vec::with_capacity(fitted.dimension() + 1);
        record.push(encoded_labels[row_index] as f64);
        record.extend(fitted.transform(doc));
        out.push_str(&vectorizer::csv_row(&record));
        out.push('\n');
    }
    out
}

/// Parse the raw dataset CSV. Expected header columns: an id, the comment
/// text, and the sentiment label; the id column is dropped.
pub fn parse_dataset(raw: &str) -> Result<Vec<RawRow>, AppError> {
    let mut lines = raw.lines();
    let header = lines
        .next()
        .ok_or_else(|| AppError::Dataset("dataset is empty".to_string()))?;
    let columns = split_csv_line(header);
    if columns.len() < 3 {
        return Err(AppError::Dataset(format!(
            "expected at least 3 columns (id, text, label), got {}",
            columns.len()
        )));
    }

    let mut rows = Vec::new();
    for (number, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_csv_line(line);
        if fields.len() < 3 {
            return Err(AppError::Dataset(format!(
                "row {} has {} fields, expected at least 3",
                number + 2,
                fields.len()
            )));
        }
        rows.push(RawRow {
            text: fields[1].clone(),
            label: fields[2].trim().to_string(),
        });
    }

    if rows.is_empty() {
        return Err(AppError::Dataset("dataset has no data rows".to_string()));
    }
    Ok(rows)
}

/// Minimal quote-aware CSV field splitter (RFC 4180 quoting, doubled
/// quotes inside quoted fields).
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

/// Encode labels to integers via a stable alphabetical mapping.
///
/// Returns the sorted class list and the per-row encoded labels. For a
/// {negative, positive} label set this yields negative=0, positive=1,
/// which the serving layer's label-to-sentiment mapping relies on.
pub fn encode_labels(labels: &[String]) -> (Vec<String>, Vec<usize>) {
    let mut classes: Vec<String> = labels.to_vec();
    classes.sort();
    classes.dedup();

    let encoded = labels
        .iter()
        .map(|label| {
            classes
                .binary_search(label)
                .expect("every label is in the class list")
        })
        .collect();

    (classes, encoded)
}

/// Stratified split by encoded label: within each class the rows are
/// shuffled with a seeded RNG and `test_fraction` of them (rounded, at
/// least one when the class has more than one row) go to the test
/// partition. Both index lists come back sorted so output order is
/// stable.
pub fn stratified_split(
    encoded_labels: &[usize],
    test_fraction: f64,
    seed: u64,
) -> (Vec<usize>, Vec<usize>) {
    let class_count = encoded_labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut per_class: Vec<Vec<usize>> = vec![Vec::new(); class_count];
    for (index, &label) in encoded_labels.iter().enumerate() {
        per_class[label].push(index);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for mut indices in per_class {
        indices.shuffle(&mut rng);
        let n_test = if indices.len() > 1 {
            ((indices.len() as f64 * test_fraction).round() as usize)
                .clamp(1, indices.len() - 1)
        } else {
            0
        };
        test.extend(indices.drain(..n_test));
        train.extend(indices);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

/// Per-row text cleaning: lowercase, punctuation to whitespace, fixed
/// stop-word lexicon removal, whitespace collapse.
pub fn clean_text(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    lowered
        .split_whitespace()
        .filter(|word| !STOP_WORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fixed Indonesian stop-word lexicon applied during cleaning.
const STOP_WORDS: &[&str] = &[
    "ada", "adalah", "adanya", "agak", "agar", "akan", "aku", "anda", "antar", "antara", "apa",
    "apabila", "apakah", "atas", "atau", "bagai", "bagaimana", "bagi", "bahkan", "bahwa",
    "banyak", "beberapa", "begitu", "belum", "berada", "berupa", "biasanya", "bila", "bisa",
    "boleh", "buat", "bukan", "dalam", "dan", "dapat", "dari", "demi", "dengan", "di", "dia",
    "dialah", "dini", "diri", "engkau", "hanya", "harus", "hingga", "ia", "ialah", "ini",
    "itu", "jadi", "jangan", "jika", "juga", "kalau", "kami", "kamu", "kapan", "karena", "ke",
    "kembali", "kemudian", "kenapa", "kepada", "ketika", "kita", "lagi", "lain", "lalu",
    "maka", "mana", "masih", "mau", "melainkan", "melalui", "memang", "mengapa", "mereka",
    "meski", "namun", "nanti", "oleh", "pada", "paling", "para", "pasti", "per", "pernah",
    "pula", "pun", "saat", "saja", "sama", "sambil", "sampai", "sana", "sangatlah", "saya",
    "seakan", "sebab", "sebagai", "sebelum", "sebuah", "sedang", "sedangkan", "sehingga",
    "sejak", "sekarang", "selain", "selalu", "selama", "seluruh", "semua", "sendiri",
    "seorang", "seperti", "sering", "serta", "sesuatu", "setelah", "setiap", "siapa", "sini",
    "situ", "suatu", "sudah", "supaya", "tanpa", "tapi", "telah", "tentang", "terhadap",
    "tersebut", "tetapi", "tiap", "untuk", "walau", "yaitu", "yang",
];
