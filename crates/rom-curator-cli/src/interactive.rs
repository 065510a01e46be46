use std::io::{self, Write};

use colored::*;

use rom_curator_core::config::MatchPolicy;
use rom_curator_core::matcher::{ConfidenceTier, MatchCandidate};
use rom_curator_core::session::{DecisionApplied, ReviewDecision};
use rom_curator_core::store::{ItemKey, UnresolvedRecord};
use rom_curator_core::MatchSession;

pub struct ReviewSummary {
    pub recorded: usize,
    pub skipped: usize,
    pub remaining: usize,
}

/// Walk the unresolved set one item at a time: show the ranked candidates,
/// let the user accept one, search the catalog with a free-text query, skip,
/// or quit. Every accepted choice is persisted before the next prompt.
pub fn review_unresolved(
    session: &mut MatchSession,
) -> Result<ReviewSummary, Box<dyn std::error::Error>> {
    let pending: Vec<(String, UnresolvedRecord)> = session
        .state()
        .unresolved
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let total = pending.len();
    let mut recorded = 0usize;
    let mut skipped = 0usize;

    if total == 0 {
        println!("Nothing to review; the unresolved set is empty.");
        return Ok(ReviewSummary {
            recorded,
            skipped,
            remaining: 0,
        });
    }

    'items: for (position, (key_str, record)) in pending.iter().enumerate() {
        let key: ItemKey = match key_str.parse() {
            Ok(key) => key,
            Err(err) => {
                eprintln!("{} {}", "Skipping malformed store key:".red(), err);
                continue;
            }
        };

        print_item_header(record, position + 1, total);
        let mut candidates = session.candidates_for(record);
        print_candidates(&candidates, session.policy());

        loop {
            let choice =
                read_line("Select a match (number, 's' to search, Enter to skip, 'q' to quit): ")?;
            let choice = choice.trim().to_lowercase();

            match choice.as_str() {
                "" | "0" => {
                    session.apply_decision(&key, ReviewDecision::Skip)?;
                    skipped += 1;
                    continue 'items;
                }
                "q" => {
                    session.apply_decision(&key, ReviewDecision::Abort)?;
                    break 'items;
                }
                "s" => {
                    let query = read_line("Search query: ")?;
                    let query = query.trim().to_string();
                    if query.is_empty() {
                        continue;
                    }
                    let results = session.search(&query, &record.category, 15);
                    if results.is_empty() {
                        println!("No results.");
                        continue;
                    }
                    candidates = results;
                    print_candidates(&candidates, session.policy());
                }
                _ => match choice.parse::<usize>() {
                    Ok(n) if n >= 1 && n <= candidates.len() => {
                        let entry = candidates[n - 1].entry.clone();
                        match session.apply_decision(&key, ReviewDecision::Accept(entry.clone())) {
                            Ok(DecisionApplied::Recorded) => {
                                println!("{} {}", "Recorded:".green(), entry.name);
                                recorded += 1;
                            }
                            Ok(_) => {}
                            Err(err) => {
                                eprintln!("{} {}", "Failed to record override:".red(), err)
                            }
                        }
                        continue 'items;
                    }
                    _ => println!("Invalid choice"),
                },
            }
        }
    }

    Ok(ReviewSummary {
        recorded,
        skipped,
        remaining: session.state().unresolved.len(),
    })
}

fn print_item_header(record: &UnresolvedRecord, position: usize, total: usize) {
    println!();
    println!("{}", "─".repeat(60).dimmed());
    println!(
        "{} {}",
        format!("[{}/{}]", position, total).bold(),
        record.filename.bold()
    );
    println!("  System: {}   Size: {} bytes", record.category, record.size);
    if let Some(fp) = record.fingerprint {
        println!("  CRC32: {}", fp);
    }
    if !record.base_name.is_empty() {
        println!("  Base name: {}", record.base_name);
    }
    if let Some(notes) = record.notes.as_deref() {
        if !notes.is_empty() {
            println!("  Notes: {}", notes.italic());
        }
    }
}

fn print_candidates(candidates: &[MatchCandidate], policy: &MatchPolicy) {
    if candidates.is_empty() {
        println!();
        println!("  No similar entries found in the catalog.");
        return;
    }

    println!();
    for (i, candidate) in candidates.iter().enumerate() {
        let score = format!("{:>3}%", candidate.score);
        let score = match candidate.tier(policy) {
            ConfidenceTier::High => score.green(),
            ConfidenceTier::Medium => score.yellow(),
            ConfidenceTier::Low => score.red(),
        };
        let entry = &candidate.entry;
        let year = entry
            .release_year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let crc = entry
            .fingerprint
            .map(|f| f.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        println!("  {}. {} {}", i + 1, score, entry.name);
        println!(
            "     Region: {} | Year: {} | CRC: {}",
            entry.region.as_deref().unwrap_or("N/A"),
            year,
            crc
        );
    }
}

fn read_line(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input)
}
