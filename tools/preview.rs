/// Preview: interactive shell for inspecting generator output.
///
/// Usage: preview [--config <path>] [--vocabulary <path>] [--seed <n>]
///
/// Commands:
///   narrative                        one scene description
///   enhance                          one description, expanded by the model
///   bulk <n>                         a deduplicated library of n descriptions with stats
///   persona <name> <role> [trait]    persona prompt for an NPC
///   prop                             a random prop
///   puzzle                           a random puzzle script
///   clues <n>                        n scene clues against an empty knowledge base
///   talk <name> <role> <message>     one NPC reply
///   seed <n>                         set RNG seed
///   help                             list commands
///   quit                             exit
use puzzle_forge::core::clues::ClueGenerator;
use puzzle_forge::core::narrative::{enhance, NarrativeGenerator};
use puzzle_forge::core::persona::PersonaGenerator;
use puzzle_forge::core::props::{random_prop, random_puzzle};
use puzzle_forge::core::similarity::similarity;
use puzzle_forge::core::vocabulary::SceneVocabulary;
use puzzle_forge::schema::npc::Persona;
use puzzle_forge::{EngineConfig, ImageFacade, LanguageModel};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, BufRead, Write};
use std::path::Path;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    let mut config_path = None;
    let mut vocabulary_path = None;
    let mut seed: u64 = 42;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--vocabulary" if i + 1 < args.len() => {
                i += 1;
                vocabulary_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Could not start runtime: {}", e);
            std::process::exit(1);
        }
    };

    let narrator = match build_narrator(vocabulary_path.as_deref()) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("Vocabulary error: {}", e);
            std::process::exit(1);
        }
    };
    let (llm, images) = match build_facades(config_path.as_deref(), seed) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(1);
        }
    };
    let personas = PersonaGenerator::new();

    println!(
        "Vocabulary: {} templates, {} extensions",
        narrator.vocabulary().templates.len(),
        narrator.vocabulary().extensions.len()
    );
    println!("Seed: {}", seed);
    println!("Type 'help' for commands.\n");

    let mut current_seed = seed;
    let mut rng = StdRng::seed_from_u64(current_seed);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "narrative" => {
                let text = narrator.generate(&mut rng);
                print_block(&format!("Narrative ({} chars)", text.chars().count()), &text);
            }
            "enhance" => {
                let local = narrator.generate(&mut rng);
                let text = runtime.block_on(enhance(&llm, &local));
                let label = if text == local { "Narrative (local)" } else { "Narrative (enhanced)" };
                print_block(label, &text);
            }
            "bulk" => {
                if parts.len() < 2 {
                    println!("Usage: bulk <n>");
                    continue;
                }
                let count: usize = match parts[1].parse() {
                    Ok(n) => n,
                    Err(_) => {
                        println!("Invalid count: {}", parts[1]);
                        continue;
                    }
                };
                let library = narrator.generate_library(count, &mut rng);
                print_library_stats(&library, count);
            }
            "persona" => {
                if parts.len() < 3 {
                    println!("Usage: persona <name> <role> [personality]");
                    continue;
                }
                let personality = parts.get(3).copied().unwrap_or("中立");
                let persona = Persona::new(parts[1], parts[2], personality, "标准");
                let text = runtime.block_on(personas.generate(&llm, &persona, &mut rng));
                print_block("Persona", &text);
            }
            "prop" => {
                let prop = random_prop(&mut rng, images.placeholder_base());
                println!("[{}] {}", prop.category, prop.name);
                println!("  {}", prop.description);
                println!("  知识: {}", prop.knowledge);
                println!("  图片: {}\n", prop.image_url);
            }
            "puzzle" => {
                let puzzle = random_puzzle(&mut rng);
                println!("{}", puzzle.title);
                println!("  {}", puzzle.description);
                println!("  线索: {}", puzzle.clue);
                println!("  答案: {}", puzzle.solution);
                println!("  知识: {}\n", puzzle.knowledge);
            }
            "clues" => {
                let count: usize = match parts.get(1).map(|p| p.parse()) {
                    Some(Ok(n)) => n,
                    Some(Err(_)) => {
                        println!("Invalid count: {}", parts[1]);
                        continue;
                    }
                    None => 3,
                };
                let generator = ClueGenerator::new(&llm, &images);
                let clues = runtime.block_on(generator.generate(count, &[], &mut rng));
                for clue in &clues {
                    println!(
                        "{} {} @ ({:.1}, {:.1})",
                        clue.id, clue.name, clue.position.x, clue.position.y
                    );
                    println!("  {}", clue.knowledge);
                }
                println!();
            }
            "talk" => {
                if parts.len() < 4 {
                    println!("Usage: talk <name> <role> <message>");
                    continue;
                }
                let persona = Persona::new(parts[1], parts[2], "中立", "标准");
                let message = parts[3..].join(" ");
                let reply = runtime.block_on(llm.converse(&persona, &message, None));
                println!("{}: {}\n", persona.name, reply);
            }
            "seed" => {
                if parts.len() < 2 {
                    println!("Current seed: {}", current_seed);
                    continue;
                }
                match parts[1].parse::<u64>() {
                    Ok(s) => {
                        current_seed = s;
                        rng = StdRng::seed_from_u64(current_seed);
                        println!("Seed set to {}", current_seed);
                    }
                    Err(_) => {
                        println!("Invalid seed: {}", parts[1]);
                    }
                }
            }
            _ => {
                println!("Unknown command: '{}'. Type 'help' for available commands.", cmd);
            }
        }
    }
}

fn build_narrator(vocabulary_path: Option<&str>) -> Result<NarrativeGenerator, String> {
    let mut vocabulary = SceneVocabulary::builtin().map_err(|e| e.to_string())?;
    if let Some(path) = vocabulary_path {
        let extra = SceneVocabulary::load_from_ron(Path::new(path)).map_err(|e| e.to_string())?;
        vocabulary.merge(extra);
    }
    NarrativeGenerator::new(vocabulary).map_err(|e| e.to_string())
}

fn build_facades(config_path: Option<&str>, seed: u64) -> Result<(LanguageModel, ImageFacade), String> {
    match config_path {
        Some(path) => {
            let config = EngineConfig::load_from_ron(Path::new(path)).map_err(|e| e.to_string())?;
            let llm = LanguageModel::from_config(&config, seed).map_err(|e| e.to_string())?;
            let images = ImageFacade::from_config(&config).map_err(|e| e.to_string())?;
            Ok((llm, images))
        }
        None => {
            let config = EngineConfig::default();
            Ok((
                LanguageModel::offline(seed),
                ImageFacade::offline(config.placeholder_base),
            ))
        }
    }
}

fn print_block(label: &str, text: &str) {
    println!("\n--- {} ---", label);
    println!("{}", text);
    println!("--- End ---\n");
}

fn print_library_stats(library: &[String], requested: usize) {
    println!("\n=== Library: {} / {} descriptions ===\n", library.len(), requested);

    let avg_len: f64 = if library.is_empty() {
        0.0
    } else {
        library.iter().map(|d| d.chars().count() as f64).sum::<f64>() / library.len() as f64
    };
    println!("Average length: {:.0} chars", avg_len);

    let mut max_similarity: f64 = 0.0;
    for (i, a) in library.iter().enumerate() {
        for b in &library[i + 1..] {
            max_similarity = max_similarity.max(similarity(a, b));
        }
    }
    println!("Closest pair similarity: {:.3}", max_similarity);

    if let Some(first) = library.first() {
        println!("\nSample description:");
        println!("  {}", first);
    }
    println!();
}

fn print_usage() {
    println!("Preview: interactive shell for inspecting generator output.");
    println!();
    println!("Usage: preview [--config <path>] [--vocabulary <path>] [--seed <n>]");
    println!();
    println!("  --config <path>      Engine config (RON); without it every backend is offline");
    println!("  --vocabulary <path>  Extra scene vocabulary (RON), merged over the built-in one");
    println!("  --seed <n>           RNG seed (default: 42)");
}

fn print_help() {
    println!("Commands:");
    println!("  narrative                      One scene description");
    println!("  enhance                        One description, expanded by the model");
    println!("  bulk <n>                       Deduplicated library of n descriptions with stats");
    println!("  persona <name> <role> [trait]  Persona prompt for an NPC");
    println!("  prop                           A random prop");
    println!("  puzzle                         A random puzzle script");
    println!("  clues [n]                      n scene clues (default 3)");
    println!("  talk <name> <role> <message>   One NPC reply");
    println!("  seed [n]                       Show or set RNG seed");
    println!("  help                           Show this help");
    println!("  quit                           Exit");
}
