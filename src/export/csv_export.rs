use anyhow::{Context, Result};
use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::models::join_variations;
use crate::orchestrator::{BatchOutcome, LookupFailure};

const HEADERS: [&str; 7] = [
    "query",
    "status",
    "canonical_name",
    "classification",
    "phonetic_code",
    "canonical_step",
    "variations",
];

pub fn export_outcomes(path: impl AsRef<Path>, outcomes: &[BatchOutcome]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let buf_writer = BufWriter::with_capacity(256 * 1024, file);
    let mut w = WriterBuilder::new().from_writer(buf_writer);
    write_outcomes(&mut w, outcomes)?;
    w.flush()?;
    Ok(())
}

pub fn write_outcomes<W: std::io::Write>(w: &mut Writer<W>, outcomes: &[BatchOutcome]) -> Result<()> {
    w.write_record(HEADERS)?;
    for o in outcomes {
        match &o.result {
            Ok(res) => w.write_record([
                o.query.as_str(),
                "resolved",
                res.canonical.name.as_str(),
                res.canonical.classification.as_str(),
                res.phonetic_code.as_str(),
                res.trace.canonical_step.as_str(),
                join_variations(&res.ordered_variations).as_str(),
            ])?,
            Err(e) => {
                let code = match e {
                    LookupFailure::NotFound(r) => r.phonetic_code().as_str(),
                    LookupFailure::Invalid(_) => "",
                };
                w.write_record([o.query.as_str(), e.kind(), "", "", code, "", ""])?
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{QueryError, ResolveError};
    use crate::matching::{
        CandidateTier, CanonicalStep, PhoneticCode, Resolution, ResolutionTrace,
    };
    use crate::models::NameRecord;

    fn resolved(q: &str) -> BatchOutcome {
        let code = PhoneticCode::from("SLF");
        BatchOutcome {
            query: q.into(),
            result: Ok(Resolution {
                canonical: NameRecord {
                    name: "SILVA".into(),
                    classification: "S".into(),
                    phonetic_code: code.clone(),
                    variations: vec!["SILVA".into(), "SYLVA".into()],
                },
                ordered_variations: vec!["SILVA".into(), "SYLVA".into()],
                phonetic_code: code,
                trace: ResolutionTrace {
                    tier: CandidateTier::ExactCode,
                    candidate_count: 1,
                    threshold_used: 0.8,
                    filter_passes: 1,
                    expansion_ran: true,
                    canonical_step: CanonicalStep::ExactName,
                },
            }),
        }
    }

    #[test]
    fn writes_one_row_per_outcome() {
        let outcomes = vec![
            resolved("silva"),
            BatchOutcome {
                query: "bob".into(),
                result: Err(ResolveError::NoPhoneticCandidates {
                    phonetic_code: PhoneticCode::from("PP"),
                }
                .into()),
            },
            BatchOutcome {
                query: "".into(),
                result: Err(QueryError::Empty.into()),
            },
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        export_outcomes(&path, &outcomes).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "query,status,canonical_name,classification,phonetic_code,canonical_step,variations"
        );
        assert_eq!(lines[1], "silva,resolved,SILVA,S,SLF,exact_name,SILVA|SYLVA");
        assert_eq!(lines[2], "bob,no_phonetic_candidates,,,PP,,");
        assert_eq!(lines[3], ",invalid_query,,,,,");
        assert_eq!(lines.len(), 4);
    }
}
