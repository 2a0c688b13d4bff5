use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::TsvArgs;
use crate::input::read_records;
use crate::model::Record;
use crate::util::ensure_directory;

struct PromptTemplate {
    instruction: &'static str,
    suffix_label: &'static str,
}

const GERMAN: PromptTemplate = PromptTemplate {
    instruction: "Given the German translation of the speech, estimate the quality of the translation as a score between 0 to 1.",
    suffix_label: "German translation",
};

const CHINESE: PromptTemplate = PromptTemplate {
    instruction: "Given the Chinese translation of the speech, estimate the quality of the translation as a score between 0 to 1.",
    suffix_label: "Chinese translation",
};

fn prompt_for(tgt_lang: &str) -> &'static PromptTemplate {
    match tgt_lang {
        "zh" => &CHINESE,
        _ => &GERMAN,
    }
}

#[derive(Debug, Serialize, PartialEq)]
struct TsvRow {
    path: String,
    sentence: String,
    split: String,
    lang: String,
    task: String,
    inst: String,
    suffix: String,
    st_system: String,
    humanda: String,
}

pub fn run(args: TsvArgs) -> Result<()> {
    let records = read_records(&args.input)?;
    info!(
        path = %args.input.display(),
        records = records.len(),
        "loaded input records"
    );

    let rows = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            to_row(record, &args.split)
                .with_context(|| format!("cannot convert record {} of {}", index + 1, args.input.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    write_rows(&args.output, &rows)?;
    info!(path = %args.output.display(), rows = rows.len(), "wrote tsv");
    Ok(())
}

fn to_row(record: &Record, split: &str) -> Result<TsvRow> {
    let audio_path = record
        .audio_path
        .as_deref()
        .context("record has no audio_path")?;
    let tgt_text = record
        .tgt_text
        .as_deref()
        .context("record has no tgt_text")?;
    let prompt = prompt_for(&record.tgt_lang);
    let human = (record.score.trunc() as i64).to_string();

    Ok(TsvRow {
        path: audio_path.to_string(),
        sentence: human.clone(),
        split: split.to_string(),
        lang: record.src_lang.clone(),
        task: format!("qe.{}2{}", record.src_lang, record.tgt_lang),
        inst: prompt.instruction.to_string(),
        suffix: format!("\n{}: {}", prompt.suffix_label, tgt_text),
        st_system: record.tgt_system.clone(),
        humanda: human,
    })
}

fn write_rows(path: &Path, rows: &[TsvRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("failed to write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn record(tgt_lang: &str, score: f64) -> Record {
        Record {
            doc_id: "d1".to_string(),
            src_lang: "en".to_string(),
            tgt_lang: tgt_lang.to_string(),
            tgt_system: "cascade".to_string(),
            score,
            audio_path: Some("wav/talk1.wav:160:32000".to_string()),
            tgt_text: Some("Ni hao".to_string()),
            score_pred: Default::default(),
        }
    }

    #[test]
    fn row_uses_target_language_prompt_and_truncated_score() {
        let row = to_row(&record("zh", 87.9), "iwslt26.dev").expect("convertible");
        assert_eq!(row.task, "qe.en2zh");
        assert_eq!(row.sentence, "87");
        assert_eq!(row.humanda, "87");
        assert_eq!(row.suffix, "\nChinese translation: Ni hao");
        assert!(row.inst.starts_with("Given the Chinese translation"));
        assert_eq!(row.lang, "en");
        assert_eq!(row.st_system, "cascade");
    }

    #[test]
    fn unknown_target_language_falls_back_to_german() {
        let row = to_row(&record("ja", 10.0), "dev").expect("convertible");
        assert!(row.inst.starts_with("Given the German translation"));
        assert!(row.suffix.starts_with("\nGerman translation: "));
    }

    #[test]
    fn record_without_audio_path_is_rejected() {
        let mut record = record("de", 50.0);
        record.audio_path = None;
        assert!(to_row(&record, "dev").is_err());
    }

    #[test]
    fn written_tsv_has_header_and_quotes_multiline_cells() {
        let path = std::env::temp_dir().join(format!("stqe-eval-tsv-{}.tsv", std::process::id()));
        let row = to_row(&record("de", 70.0), "dev").expect("convertible");
        write_rows(&path, &[row]).expect("write tsv");

        let text = fs::read_to_string(&path).expect("read tsv");
        let header = text.lines().next().expect("header");
        assert_eq!(
            header,
            "path\tsentence\tsplit\tlang\ttask\tinst\tsuffix\tst_system\thumanda"
        );
        assert!(text.contains("\"\nGerman translation: Ni hao\""));

        fs::remove_file(&path).ok();
    }
}
