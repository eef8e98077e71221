use clap::Parser;
use langrule::{CheckOptions, LanguageRegistry};
use std::{
    io::{self, Read},
    path::PathBuf,
};

#[derive(Parser)]
#[clap(version, about = "Checks text for grammar, style and spelling problems.")]
struct Opts {
    /// The text to check. Read from stdin if missing.
    text: Option<String>,
    #[clap(long, short, default_value = "en")]
    lang: String,
    /// A language directory to load instead of the built-in data.
    #[clap(long)]
    dir: Option<PathBuf>,
    /// Rules to enable, e.g. `STYLE/VERY_GOOD`.
    #[clap(long)]
    enable: Vec<String>,
    /// Rules to disable, e.g. `SPELLING_RULE`.
    #[clap(long)]
    disable: Vec<String>,
    #[clap(long)]
    mother_tongue: Option<String>,
    /// Prints the matches as JSON.
    #[clap(long)]
    json: bool,
    /// Checks the rules against their examples instead of checking text.
    #[clap(long)]
    test: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let opts = Opts::parse();

    let registry = LanguageRegistry::with_builtin();
    if let Some(dir) = &opts.dir {
        registry.register_dir(&opts.lang, dir.clone());
    }
    let language = registry.get_or_load(&opts.lang)?;

    if opts.test {
        if language.test() {
            println!("All rule examples passed.");
            return Ok(());
        }
        return Err("some rule examples failed, see the log for details".into());
    }

    let text = match opts.text {
        Some(text) => text,
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text
        }
    };

    let mut options = CheckOptions {
        mother_tongue: opts.mother_tongue,
        ..CheckOptions::default()
    };
    options.enabled_rule_ids.extend(opts.enable);
    options.disabled_rule_ids.extend(opts.disable);

    let result = language.check(&text, &options);

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let chars: Vec<char> = text.chars().collect();
    for rule_match in result.matches() {
        let flagged: String = chars[rule_match.from_pos()..rule_match.to_pos()].iter().collect();

        println!(
            "{}..{} \"{}\" [{}] {}",
            rule_match.from_pos(),
            rule_match.to_pos(),
            flagged,
            rule_match.rule_id(),
            rule_match.message()
        );
        if !rule_match.replacements().is_empty() {
            println!("    suggestions: {}", rule_match.replacements().join(", "));
        }
    }

    Ok(())
}
