use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use lcr_archive::{
    ArchiveFile, CheckpointSchedule, FileCategory, HeaderRecordReader, TxSetRecordReader,
};
use lcr_catchup::{HistoryPublisher, LedgerChainReplayer, ReplayConfig, StepState};
use lcr_crypto::{tx_set_contents_hash, HeaderChainVerifier};
use lcr_ledger::{InMemoryLedgerSink, LedgerApplicationSink};
use lcr_types::{LedgerHeaderRecord, LedgerRange, LedgerSeq, Transaction, TransactionSetRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use tracing::{debug, info};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    debug!(command = cli.command.name(), format = ?cli.format, "dispatching command");
    match cli.command {
        Command::Generate(args) => cmd_generate(args, &cli.format),
        Command::Inspect(args) => cmd_inspect(args, &cli.format),
        Command::Verify(args) => cmd_verify(args, &cli.format),
        Command::Replay(args) => cmd_replay(args, &cli.format),
    }
}

fn cmd_generate(args: GenerateArgs, format: &OutputFormat) -> anyhow::Result<()> {
    if args.ledgers < 2 {
        bail!("--ledgers must be at least 2, genesis is ledger 1");
    }
    let schedule = CheckpointSchedule::new(args.frequency)?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!(
        dir = %args.dir.display(),
        ledgers = args.ledgers,
        frequency = args.frequency,
        "generating archive"
    );
    let sink = Arc::new(InMemoryLedgerSink::from_genesis());
    let mut publisher = HistoryPublisher::start(args.dir.clone(), schedule, sink)?;
    let mut transactions = 0u64;
    for seq in 2..=args.ledgers {
        let count = rng.gen_range(0..=args.max_txs);
        let mut txs = Vec::new();
        for _ in 0..count {
            let len = rng.gen_range(32..=128);
            let envelope: Vec<u8> = (0..len).map(|_| rng.gen::<u8>()).collect();
            txs.push(Transaction::new(envelope));
        }
        transactions += u64::from(count);
        publisher.close_ledger(txs, u64::from(seq) * 5)?;
    }
    let lcl = publisher.sink().last_closed_ledger()?;
    let files = publisher.finish()?;

    match format {
        OutputFormat::Json => {
            let checkpoints: Vec<_> = files
                .iter()
                .map(|f| {
                    json!({
                        "checkpoint": f.checkpoint,
                        "ledgers": f.ledgers,
                        "tx_sets": f.tx_sets,
                        "header_path": f.header_path.display().to_string(),
                        "tx_path": f.tx_path.display().to_string(),
                    })
                })
                .collect();
            let out = json!({
                "lcl": { "seq": lcl.sequence(), "hash": lcl.hash.to_hex() },
                "transactions": transactions,
                "checkpoints": checkpoints,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!(
                "{} Published ledgers 1..{} ({} transactions) to {}",
                "✓".green().bold(),
                lcl.sequence(),
                transactions,
                args.dir.display().to_string().bold()
            );
            for f in &files {
                println!(
                    "  checkpoint {}: {} ledgers, {} tx sets",
                    f.checkpoint.to_string().yellow(),
                    f.ledgers,
                    f.tx_sets
                );
            }
            println!("  LCL: {}", lcl.abbrev().cyan());
        }
    }
    Ok(())
}

fn read_checkpoint(
    root: &Path,
    checkpoint: LedgerSeq,
) -> anyhow::Result<(Vec<LedgerHeaderRecord>, Vec<TransactionSetRecord>)> {
    let mut headers = Vec::new();
    let mut reader = HeaderRecordReader::new();
    reader.open(&ArchiveFile::new(FileCategory::Ledger, checkpoint).local_path(root))?;
    while let Some(header) = reader.read_one()? {
        headers.push(header);
    }

    let mut tx_sets = Vec::new();
    let mut reader = TxSetRecordReader::new();
    reader.open(&ArchiveFile::new(FileCategory::Transactions, checkpoint).local_path(root))?;
    while let Some(record) = reader.read_one()? {
        tx_sets.push(record);
    }
    Ok((headers, tx_sets))
}

fn cmd_inspect(args: InspectArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let schedule = CheckpointSchedule::new(args.frequency)?;
    if !schedule.is_checkpoint(args.checkpoint) {
        bail!(
            "{} is not a checkpoint at frequency {}; ledger {} is archived in checkpoint {}",
            args.checkpoint,
            args.frequency,
            args.checkpoint,
            schedule.checkpoint_containing(args.checkpoint)?
        );
    }
    let (headers, tx_sets) = read_checkpoint(&args.dir, args.checkpoint)
        .with_context(|| format!("reading checkpoint {}", args.checkpoint))?;
    let by_seq: HashMap<LedgerSeq, &TransactionSetRecord> =
        tx_sets.iter().map(|r| (r.ledger_seq, r)).collect();

    match format {
        OutputFormat::Json => {
            let ledgers: Vec<_> = headers
                .iter()
                .map(|h| {
                    let record = by_seq.get(&h.sequence());
                    json!({
                        "seq": h.sequence(),
                        "hash": h.hash.to_hex(),
                        "previous_hash": h.previous_hash().to_hex(),
                        "tx_set_hash": h.tx_set_hash().to_hex(),
                        "close_time": h.consensus_value().close_time,
                        "transactions": record.map_or(0, |r| r.tx_set.len()),
                        "tx_set_matches": record
                            .map(|r| tx_set_contents_hash(&r.tx_set) == h.tx_set_hash()),
                    })
                })
                .collect();
            let out = json!({ "checkpoint": args.checkpoint, "ledgers": ledgers });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!(
                "Checkpoint {}: {} ledgers, {} tx sets",
                args.checkpoint.to_string().yellow().bold(),
                headers.len(),
                tx_sets.len()
            );
            for h in &headers {
                let txs = match by_seq.get(&h.sequence()) {
                    Some(r) if tx_set_contents_hash(&r.tx_set) == h.tx_set_hash() => {
                        format!("{} txs", r.tx_set.len()).green()
                    }
                    Some(r) => format!("{} txs, hash mismatch", r.tx_set.len()).red(),
                    None => "empty".dimmed(),
                };
                println!(
                    "  {:>8}  {}  prev {}  {}",
                    h.sequence(),
                    h.hash.abbrev().cyan(),
                    h.previous_hash().abbrev().dimmed(),
                    txs
                );
            }
        }
    }
    Ok(())
}

fn cmd_verify(args: VerifyArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let schedule = CheckpointSchedule::new(args.frequency)?;
    let range = LedgerRange::new(args.first, args.last)?;

    let mut chain = Vec::new();
    let mut tx_sets_checked = 0u64;
    let mut checkpoint = schedule.checkpoint_containing(range.first())?;
    let final_checkpoint = schedule.checkpoint_containing(range.last())?;
    loop {
        let (headers, tx_sets) = read_checkpoint(&args.dir, checkpoint)
            .with_context(|| format!("reading checkpoint {checkpoint}"))?;
        let by_seq: HashMap<LedgerSeq, &LedgerHeaderRecord> =
            headers.iter().map(|h| (h.sequence(), h)).collect();
        for record in tx_sets.iter().filter(|r| range.contains(r.ledger_seq)) {
            let Some(header) = by_seq.get(&record.ledger_seq) else {
                bail!("tx set archived for ledger {} has no header", record.ledger_seq);
            };
            let actual = tx_set_contents_hash(&record.tx_set);
            if actual != header.tx_set_hash() {
                bail!(
                    "tx set for ledger {} hashes to {}, header expects {}",
                    record.ledger_seq,
                    actual.abbrev(),
                    header.tx_set_hash().abbrev()
                );
            }
            tx_sets_checked += 1;
        }
        debug!(checkpoint, headers = headers.len(), tx_sets = tx_sets.len(), "read checkpoint");
        chain.extend(headers.into_iter().filter(|h| range.contains(h.sequence())));

        if checkpoint >= final_checkpoint {
            break;
        }
        checkpoint = schedule.next(checkpoint)?;
    }

    HeaderChainVerifier::verify_chain(&chain).context("header chain verification failed")?;
    let covered = chain.first().map(|h| h.sequence()) == Some(range.first())
        && chain.len() as u64 == range.len();
    if !covered {
        bail!("archive covers {} of the {} ledgers in {}", chain.len(), range.len(), range);
    }

    match format {
        OutputFormat::Json => {
            let out = json!({
                "first": range.first(),
                "last": range.last(),
                "headers": chain.len(),
                "tx_sets": tx_sets_checked,
                "valid": true,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!("{} Header chain {} verified", "✓".green().bold(), range.to_string().bold());
            println!("  Headers: {}", chain.len().to_string().green());
            println!("  Tx sets: {}", tx_sets_checked.to_string().green());
        }
    }
    Ok(())
}

fn cmd_replay(args: ReplayArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ReplayConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ReplayConfig::default(),
    };
    if let Some(dir) = args.dir {
        config.download_dir = dir;
    }
    if let Some(frequency) = args.frequency {
        config.checkpoint_frequency = frequency;
    }
    config.validate()?;
    let range = LedgerRange::new(args.first, args.last)?;
    info!(
        range = %range,
        dir = %config.download_dir.display(),
        frequency = config.checkpoint_frequency,
        "starting replay"
    );

    let sink = Arc::new(InMemoryLedgerSink::from_genesis());
    let lcl = sink.last_closed_ledger()?;
    let mut replayer = LedgerChainReplayer::new(config, sink, range, lcl)?;

    let mut shown = None;
    let report = loop {
        let report = replayer.step()?;
        if !report.is_running() {
            break report;
        }
        if matches!(format, OutputFormat::Text) && shown != Some(replayer.current_checkpoint()) {
            println!("  {}", replayer.status().dimmed());
            shown = Some(replayer.current_checkpoint());
        }
    };
    let metrics = replayer.metrics().snapshot();

    let error = match &report.state {
        StepState::Failure(err) => Some(err.to_string()),
        StepState::Success | StepState::Running => None,
    };
    match format {
        OutputFormat::Json => {
            let out = json!({
                "status": replayer.status(),
                "last_applied": {
                    "seq": report.last_applied.sequence(),
                    "hash": report.last_applied.hash.to_hex(),
                },
                "applied": metrics.success,
                "failed": metrics.failure,
                "attempted": metrics.total(),
                "error": error,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            let mark = if error.is_none() { "✓".green().bold() } else { "✗".red().bold() };
            println!("{} {}", mark, replayer.status());
            println!("  Last applied: {}", report.last_applied.abbrev().cyan());
            println!(
                "  Applied: {}, failed: {} ({} attempted)",
                metrics.success,
                metrics.failure,
                metrics.total()
            );
        }
    }

    match report.state {
        StepState::Failure(err) => Err(err).context(format!("replay of {range} failed")),
        StepState::Success | StepState::Running => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn generate(dir: &Path, ledgers: u32, frequency: u32) {
        cmd_generate(
            GenerateArgs {
                dir: dir.to_path_buf(),
                ledgers,
                frequency,
                max_txs: 3,
                seed: Some(7),
            },
            &OutputFormat::Json,
        )
        .unwrap();
    }

    #[test]
    fn generated_archive_verifies_and_replays() {
        let dir = tempfile::tempdir().unwrap();
        generate(dir.path(), 40, 16);

        cmd_verify(
            VerifyArgs { dir: dir.path().to_path_buf(), first: 1, last: 40, frequency: 16 },
            &OutputFormat::Text,
        )
        .unwrap();
        cmd_inspect(
            InspectArgs { dir: dir.path().to_path_buf(), checkpoint: 31, frequency: 16 },
            &OutputFormat::Text,
        )
        .unwrap();
        cmd_replay(
            ReplayArgs {
                dir: Some(dir.path().to_path_buf()),
                first: 2,
                last: 40,
                frequency: Some(16),
                config: None,
            },
            &OutputFormat::Json,
        )
        .unwrap();
    }

    #[test]
    fn same_seed_publishes_same_chain() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        generate(a.path(), 20, 8);
        generate(b.path(), 20, 8);
        let (left, _) = read_checkpoint(a.path(), 23).unwrap();
        let (right, _) = read_checkpoint(b.path(), 23).unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn inspect_rejects_non_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let err = cmd_inspect(
            InspectArgs { dir: dir.path().to_path_buf(), checkpoint: 70, frequency: 64 },
            &OutputFormat::Text,
        )
        .unwrap_err();
        assert!(err.to_string().contains("checkpoint 127"));
    }

    #[test]
    fn verify_fails_past_archive_end() {
        let dir = tempfile::tempdir().unwrap();
        generate(dir.path(), 20, 8);
        let result = cmd_verify(
            VerifyArgs { dir: dir.path().to_path_buf(), first: 1, last: 30, frequency: 8 },
            &OutputFormat::Text,
        );
        assert!(result.is_err());
    }

    #[test]
    fn replay_past_archive_end_fails() {
        let dir = tempfile::tempdir().unwrap();
        generate(dir.path(), 20, 8);
        let result = cmd_replay(
            ReplayArgs {
                dir: Some(dir.path().to_path_buf()),
                first: 2,
                last: 30,
                frequency: Some(8),
                config: None,
            },
            &OutputFormat::Text,
        );
        assert!(result.is_err());
    }

    #[test]
    fn range_at_sequence_limit_is_rejected_not_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let dir_arg = dir.path().display().to_string();
        let first = (u32::MAX - 3).to_string();
        for command in ["verify", "replay"] {
            let cli = Cli::try_parse_from([
                "lcr",
                command,
                "--dir",
                dir_arg.as_str(),
                "--first",
                first.as_str(),
                "--last",
                "4294967295",
                "--frequency",
                "100",
            ])
            .unwrap();
            assert_eq!(cli.command.name(), command);
            let err = run_command(cli).unwrap_err();
            assert!(
                format!("{err:#}").contains("exceeds the ledger sequence range"),
                "{command}: {err:#}"
            );
        }
    }

    #[test]
    fn replay_reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        generate(dir.path(), 20, 8);
        let config = dir.path().join("replay.toml");
        std::fs::write(
            &config,
            format!(
                "download_dir = {:?}\ncheckpoint_frequency = 8\n",
                dir.path().display().to_string()
            ),
        )
        .unwrap();
        cmd_replay(
            ReplayArgs { dir: None, first: 2, last: 20, frequency: None, config: Some(config) },
            &OutputFormat::Text,
        )
        .unwrap();
    }
}
