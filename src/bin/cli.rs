//! Triage Live CLI
//!
//! Command-line client for a running `triage-live` service:
//! - Show the queue, a patient's vitals trend and emergencies
//! - Submit triage forms and documents
//! - Talk to the triage assistant
//! - Inspect fairness statistics and the doctor directory

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use triage_live::backend::{ensure_pdf, IntakeForm};
use triage_live::queue::{PatientRecord, VitalsSample};

#[derive(Parser)]
#[command(name = "triage-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Client for the live triage dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Local view API URL
    #[arg(long, default_value = "http://localhost:8090", global = true)]
    pub api_url: String,

    /// Output format (table, json, csv)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a page of the queue
    Queue {
        /// Role tab (mine, all)
        #[arg(short, long)]
        tab: Option<String>,
        /// Only patients assigned to this doctor
        #[arg(short, long)]
        doctor: Option<String>,
        /// Clear the doctor override
        #[arg(long, conflicts_with = "doctor")]
        clear_doctor: bool,
        /// Page to show (default: current)
        #[arg(short, long)]
        page: Option<u32>,
    },

    /// Show a patient's vitals trend
    History {
        /// Patient ID
        patient: String,
    },

    /// Find the first critical patient
    Emergency,

    /// Submit a triage form for prediction
    Predict {
        #[arg(long)]
        age: String,
        #[arg(long, default_value = "Male")]
        gender: String,
        #[arg(long)]
        bp_systolic: String,
        #[arg(long)]
        bp_diastolic: String,
        #[arg(long)]
        heart_rate: String,
        #[arg(long)]
        temperature: String,
        #[arg(long)]
        o2_saturation: String,
        #[arg(long, default_value = "")]
        symptoms: String,
        #[arg(long, default_value = "")]
        notes: String,
        #[arg(long, default_value = "")]
        conditions: String,
    },

    /// Extract vitals from a PDF document
    Upload {
        /// Path to the PDF
        path: PathBuf,
    },

    /// Ask the triage assistant
    Chat {
        /// Message (words are joined)
        message: Vec<String>,
    },

    /// Show risk distribution by gender and age group
    Bias,

    /// List doctors by department
    Doctors,

    /// Set a doctor's availability
    Availability {
        /// Doctor name, e.g. "Dr. Heart"
        doctor: String,
        /// available or busy
        status: String,
    },

    /// Show service and backend status
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let api = format!("{}/api/v1", cli.api_url.trim_end_matches('/'));

    match cli.command {
        Commands::Queue {
            tab,
            doctor,
            clear_doctor,
            page,
        } => {
            let mut update = serde_json::Map::new();
            if let Some(tab) = tab {
                update.insert("tab".into(), Value::String(tab));
            }
            if let Some(doctor) = doctor {
                update.insert("doctor".into(), Value::String(doctor));
            } else if clear_doctor {
                update.insert("doctor".into(), Value::Null);
            }
            if !update.is_empty() {
                let response = client
                    .put(format!("{}/queue/view", api))
                    .json(&update)
                    .send()
                    .await?;
                check(response).await?;
            }

            let mut request = client.get(format!("{}/queue", api));
            if let Some(page) = page {
                request = request.query(&[("page", page)]);
            }
            let view: Value = check(request.send().await?).await?.json().await?;

            let records: Vec<PatientRecord> =
                serde_json::from_value(view["records"].clone()).context("decoding queue page")?;

            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&view)?),
                "csv" => print_queue_csv(&records)?,
                _ => print_queue_table(&view, &records),
            }
        }

        Commands::History { patient } => {
            let response = client
                .get(format!("{}/patients/{}/history", api, patient))
                .send()
                .await?;
            let samples: Vec<VitalsSample> = check(response).await?.json().await?;

            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&samples)?),
                "csv" => print_history_csv(&samples)?,
                _ => print_history_table(&patient, &samples),
            }
        }

        Commands::Emergency => {
            let response = client
                .post(format!("{}/alerts/emergency", api))
                .send()
                .await?;
            let result: Value = check(response).await?.json().await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else if result["result"] == "critical" {
                let record = &result["patient"]["record"];
                println!("{}", result["notification"]["message"].as_str().unwrap_or("CRITICAL"));
                println!();
                println!("  Patient:  {}", record["Patient_ID"]);
                println!("  Doctor:   {}", record["Assigned_Doctor"].as_str().unwrap_or("-"));
                println!("  Symptoms: {}", record["Symptoms"].as_str().unwrap_or("-"));
            } else {
                println!("No critical patients at the moment.");
            }
        }

        Commands::Predict {
            age,
            gender,
            bp_systolic,
            bp_diastolic,
            heart_rate,
            temperature,
            o2_saturation,
            symptoms,
            notes,
            conditions,
        } => {
            let form = IntakeForm {
                age,
                gender,
                bp_systolic,
                bp_diastolic,
                heart_rate,
                temperature,
                o2_saturation,
                symptoms,
                medical_notes: notes,
                pre_existing_conditions: conditions,
            };
            // Catch bad input before anything leaves the machine
            form.validate()?;

            let response = client
                .post(format!("{}/triage", api))
                .json(&form)
                .send()
                .await?;
            let record: PatientRecord = check(response).await?.json().await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("Patient {} triaged", record.id);
                println!(
                    "  Risk:       {}",
                    record.effective_risk().map(|r| r.as_str()).unwrap_or("-")
                );
                if let Some(confidence) = record.risk_confidence {
                    println!("  Confidence: {:.1}%", confidence);
                }
                println!("  Department: {}", record.department.as_deref().unwrap_or("-"));
                println!("  Doctor:     {}", record.assigned_doctor.as_deref().unwrap_or("-"));
                if !record.explanation.is_empty() {
                    println!("  Factors:    {}", record.explanation.join(", "));
                }
            }
        }

        Commands::Upload { path } => {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            ensure_pdf(&file_name)?;

            let bytes = std::fs::read(&path).with_context(|| format!("reading {:?}", path))?;
            let part = reqwest::multipart::Part::bytes(bytes)
                .file_name(file_name)
                .mime_str("application/pdf")?;
            let form = reqwest::multipart::Form::new().part("file", part);

            let response = client
                .post(format!("{}/triage/upload", api))
                .multipart(form)
                .send()
                .await?;
            let result: Value = check(response).await?.json().await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Extracted fields:");
                match result["extraction"]["extracted_data"].as_object() {
                    Some(fields) if !fields.is_empty() => {
                        for (key, value) in fields {
                            println!("  {:<15} {}", key, value);
                        }
                    }
                    _ => println!("  (none)"),
                }
                println!();
                println!(
                    "Preview: {}",
                    result["extraction"]["extracted_text_preview"]
                        .as_str()
                        .unwrap_or("")
                );
            }
        }

        Commands::Chat { message } => {
            let message = message.join(" ");
            let response = client
                .post(format!("{}/chat", api))
                .json(&serde_json::json!({ "message": message }))
                .send()
                .await?;
            let reply: Value = check(response).await?.json().await?;
            println!("{}", reply["content"].as_str().unwrap_or(""));
        }

        Commands::Bias => {
            let response = client.get(format!("{}/bias", api)).send().await?;
            let report: Value = check(response).await?.json().await?;

            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                "csv" => print_bias_csv(&report)?,
                _ => {
                    print_bias_table("Gender", &report["gender"]);
                    println!();
                    print_bias_table("Age group", &report["age"]);
                }
            }
        }

        Commands::Doctors => {
            let response = client.get(format!("{}/doctors", api)).send().await?;
            let grouped: Value = check(response).await?.json().await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&grouped)?);
            } else if let Some(departments) = grouped.as_object() {
                println!("{:<20} {:<20} {:<10} {}", "Department", "Name", "Status", "Speciality");
                println!("{}", "-".repeat(75));
                for (dept, doctors) in departments {
                    for doctor in doctors.as_array().into_iter().flatten() {
                        println!(
                            "{:<20} {:<20} {:<10} {}",
                            dept,
                            doctor["name"].as_str().unwrap_or("-"),
                            doctor["status"].as_str().unwrap_or("-"),
                            doctor["spec"].as_str().unwrap_or("-"),
                        );
                    }
                }
            }
        }

        Commands::Availability { doctor, status } => {
            let status: triage_live::backend::Availability =
                status.parse().map_err(anyhow::Error::msg)?;
            let response = client
                .post(format!("{}/doctors/availability", api))
                .json(&serde_json::json!({ "doctor_name": doctor, "status": status }))
                .send()
                .await?;
            let result: Value = check(response).await?.json().await?;
            println!(
                "{} is now {}",
                doctor,
                result["new_state"].as_str().unwrap_or(status.as_str())
            );
        }

        Commands::Status => {
            let response = client
                .get(format!("{}/health", cli.api_url.trim_end_matches('/')))
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: Value = resp.json().await?;

                    if cli.format == "json" {
                        println!("{}", serde_json::to_string_pretty(&health)?);
                        return Ok(());
                    }

                    println!("Triage Live v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!("Status:        {}", health["status"].as_str().unwrap_or("unknown"));
                    println!("Backend:       {}", health["backend"].as_str().unwrap_or("unknown"));
                    println!("Models loaded: {}", health["models_loaded"]);
                    println!("Push channel:  {}", on_off(&health["push_connected"]));
                    println!("Simulation:    {}", on_off(&health["simulation_running"]));
                    println!("Queue size:    {}", health["queue_size"]);
                    println!("View clients:  {}", health["ws_connections"]);
                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!("Uptime:        {}", format_duration(uptime));
                    }
                }
                Ok(resp) => bail!("Service returned error: {}", resp.status()),
                Err(e) => {
                    eprintln!("Cannot connect to Triage Live at {}", cli.api_url);
                    eprintln!();
                    eprintln!("Make sure the service is running:");
                    eprintln!("  cargo run --bin triage-live");
                    return Err(e.into());
                }
            }
        }

        Commands::Config { output } => {
            let config = triage_live::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", config),
            }
        }
    }

    Ok(())
}

/// Turn an error response into an error carrying the service's message
async fn check(response: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = body["error"]["message"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string());
    bail!("{} ({})", message, status)
}

fn on_off(value: &Value) -> &'static str {
    if value.as_bool().unwrap_or(false) {
        "on"
    } else {
        "off"
    }
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| "-".to_string())
}

fn print_queue_table(view: &Value, records: &[PatientRecord]) {
    if records.is_empty() {
        println!("No patients in this view");
        return;
    }

    println!(
        "{:<14} {:<20} {:<8} {:<6} {:<6} {:<5} {}",
        "ID", "Name", "Risk", "HR", "Temp", "O2", "Doctor"
    );
    println!("{}", "-".repeat(80));

    for record in records {
        println!(
            "{:<14} {:<20} {:<8} {:<6} {:<6} {:<5} {}",
            record.id.to_string(),
            record.display_name(),
            record.effective_risk().map(|r| r.as_str()).unwrap_or("-"),
            fmt_opt(record.heart_rate),
            fmt_opt(record.temperature),
            fmt_opt(record.o2_saturation),
            record.assigned_doctor.as_deref().unwrap_or("-"),
        );
    }

    println!();
    println!(
        "Page {} of {} ({} patients)",
        view["page"], view["total_pages"], view["total_matching"]
    );
    if view["has_emergency"].as_bool().unwrap_or(false) {
        println!("!! High-risk patients in queue");
    }
}

fn print_queue_csv(records: &[PatientRecord]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record(["id", "name", "risk", "heart_rate", "temperature", "o2_saturation", "doctor"])?;
    for record in records {
        writer.write_record([
            record.id.to_string(),
            record.display_name().to_string(),
            record
                .effective_risk()
                .map(|r| r.as_str().to_string())
                .unwrap_or_default(),
            record.heart_rate.map(|v| v.to_string()).unwrap_or_default(),
            record.temperature.map(|v| v.to_string()).unwrap_or_default(),
            record.o2_saturation.map(|v| v.to_string()).unwrap_or_default(),
            record.assigned_doctor.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_history_table(patient: &str, samples: &[VitalsSample]) {
    if samples.is_empty() {
        println!("No vitals recorded for patient {}", patient);
        return;
    }

    println!("{:<10} {:<6} {:<6} {:<5} {}", "Time", "HR", "Temp", "O2", "BP sys");
    println!("{}", "-".repeat(40));
    for sample in samples {
        println!(
            "{:<10} {:<6} {:<6} {:<5} {}",
            sample.time_label(),
            fmt_opt(sample.heart_rate),
            fmt_opt(sample.temperature),
            fmt_opt(sample.o2_saturation),
            fmt_opt(sample.bp_systolic),
        );
    }
}

fn print_history_csv(samples: &[VitalsSample]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record(["time", "heart_rate", "temperature", "o2_saturation", "bp_systolic"])?;
    for sample in samples {
        writer.write_record([
            sample.time.to_rfc3339(),
            sample.heart_rate.map(|v| v.to_string()).unwrap_or_default(),
            sample.temperature.map(|v| v.to_string()).unwrap_or_default(),
            sample.o2_saturation.map(|v| v.to_string()).unwrap_or_default(),
            sample.bp_systolic.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_bias_table(title: &str, rows: &Value) {
    println!("{:<12} {:>6} {:>6} {:>6}", title, "High", "Medium", "Low");
    println!("{}", "-".repeat(33));
    for row in rows.as_array().into_iter().flatten() {
        println!(
            "{:<12} {:>6} {:>6} {:>6}",
            row["name"].as_str().unwrap_or("-"),
            row["high"],
            row["medium"],
            row["low"],
        );
    }
}

fn print_bias_csv(report: &Value) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record(["dimension", "name", "high", "medium", "low"])?;
    for dimension in ["gender", "age"] {
        for row in report[dimension].as_array().into_iter().flatten() {
            writer.write_record([
                dimension.to_string(),
                row["name"].as_str().unwrap_or_default().to_string(),
                row["high"].to_string(),
                row["medium"].to_string(),
                row["low"].to_string(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}
