//! qbank CLI - Convert question bank CSV files to the quiz template
//!
//! # Commands
//!
//! ```bash
//! qbank convert bank.csv             # Write bank_converted.csv next to the input
//! qbank convert bank.csv -o quiz.csv # Choose the output file
//! qbank preview bank.csv             # Show converted questions, write nothing
//! qbank guide                        # Show how columns are mapped
//! qbank serve                        # Start HTTP server (port 3000)
//! ```

use clap::{Parser, Subcommand};
use qbank::{
    convert_and_save, convert_file, default_output_path, ConversionReport, ConvertOptions,
    PreviewResponse, RunStatus, ServerConfig, DEFAULT_MARKS,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "qbank")]
#[command(about = "Convert Q/A question bank CSV files to the quiz template", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a question bank and write the quiz template CSV
    Convert {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: <input stem>_converted.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Marks for questions with a blank Marks cell
        #[arg(long, default_value = DEFAULT_MARKS)]
        default_marks: String,

        /// Replace the output file if it exists
        #[arg(short, long)]
        force: bool,
    },

    /// Convert in memory and show the result
    Preview {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Print the preview as JSON
        #[arg(long)]
        json: bool,

        /// Number of questions to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show how source columns map to the quiz template
    Guide,

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: QBANK_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            delimiter,
            default_marks,
            force,
        } => {
            let options = ConvertOptions {
                delimiter,
                default_marks,
                overwrite: force,
                echo_log: true,
            };
            cmd_convert(&input, output.as_deref(), &options)
        }

        Commands::Preview {
            input,
            delimiter,
            json,
            limit,
        } => cmd_preview(&input, delimiter, json, limit),

        Commands::Guide => cmd_guide(),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    options: &ConvertOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input));

    let report = convert_and_save(input, &output, options)?;

    eprintln!("\n📊 Summary");
    print_stats(&report);

    if report.status == RunStatus::NothingWritten {
        return Err(format!(
            "no question could be converted ({} failed); {} not written",
            report.stats.failed,
            output.display()
        )
        .into());
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_preview(
    input: &Path,
    delimiter: Option<char>,
    json: bool,
    limit: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = ConvertOptions {
        delimiter,
        ..ConvertOptions::default()
    };
    let report = convert_file(input, &options)?;

    if json {
        let file_name = input.file_name().map(|n| n.to_string_lossy().into_owned());
        let response = PreviewResponse::from_report(report, file_name);
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    for line in report.log.lines() {
        eprintln!("{}", line);
    }

    println!();
    for record in report.records.iter().take(limit) {
        let row = record.to_row();
        println!("[row {}] {}", record.source_line, row.question_text);
        println!(
            "   type: {}   correct: {}   difficulty: {}   marks: {}",
            row.question_type,
            if row.correct_answer.is_empty() { "-" } else { row.correct_answer.as_str() },
            row.difficulty_level,
            row.marks
        );
        for (letter, option) in ["a", "b", "c", "d"].iter().zip(&record.options) {
            println!("   {}) {}", letter, option);
        }
    }
    if report.records.len() > limit {
        println!("... {} more", report.records.len() - limit);
    }
    if report.records.is_empty() {
        println!("No questions were detected in {}", input.display());
    }

    eprintln!();
    print_stats(&report);
    Ok(())
}

fn print_stats(report: &ConversionReport) {
    let stats = &report.stats;
    eprintln!("   Encoding:       {}", report.csv_info.encoding);
    eprintln!("   Rows read:      {}", report.csv_info.row_count);
    eprintln!("   Questions:      {}", stats.questions);
    eprintln!("   Converted:      {}", stats.converted);
    eprintln!("   Excluded:       {}", stats.failed);
    if stats.orphan_answers > 0 {
        eprintln!("   Orphan answers: {}", stats.orphan_answers);
    }
    if stats.skipped_rows > 0 {
        eprintln!("   Skipped rows:   {}", stats.skipped_rows);
    }
    if let Some(ref path) = report.output_path {
        eprintln!("   Output:         {}", path.display());
    }
}

fn cmd_guide() -> Result<(), Box<dyn std::error::Error>> {
    let rows = [
        ("TNpe = Q → Description", "question_text", "Question rows keep their description as the main text."),
        ("QuestionTNpe (R/C/L)", "question_type", "R & C become 'multiple_choice'; L becomes 'short_answer'. Blank means R."),
        ("TNpe = A → Description", "option_a-d", "Answer descriptions fill up to four options in order."),
        ("IsRightAnswer = Y", "correct_answer", "Letters a–d; several letters only for C (checkbox) questions."),
        ("Marks", "marks", "Copied as is; blank becomes the default (1)."),
        ("LEVEL", "difficulty_level", "1/2/3 or easy/medium/hard labels; blank means easy."),
        ("IsImage / ImagePath", "ignored", "Image information is not carried over."),
    ];

    println!("{:<26} {:<18} {}", "Source", "Quiz template", "Rule");
    println!("{}", "-".repeat(90));
    for (source, target, rule) in rows {
        println!("{:<26} {:<18} {}", source, target, rule);
    }
    Ok(())
}

async fn cmd_serve(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ServerConfig::from_env();
    if let Some(port) = port {
        config.port = port;
    }
    qbank::server::start_server(config).await
}
