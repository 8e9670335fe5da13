use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{FormController, IntakeClient, SubmitRefused};
use shared::{
    domain::{BudgetBracket, ContactKind, ContactSubmission, ProposalSubmission},
    error::FieldErrors,
    protocol::SubmissionResult,
    validation::Submission,
};
use storage::Storage;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://data/portfolio.db")]
    database_url: String,
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    SendContact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        subject: String,
        #[arg(long, value_parser = parse_contact_kind, default_value = "job")]
        kind: ContactKind,
        #[arg(long)]
        message: String,
    },
    SendProposal {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        company: Option<String>,
        #[arg(long, value_parser = parse_budget)]
        budget: BudgetBracket,
        #[arg(long)]
        deadline: String,
        #[arg(long)]
        description: String,
    },
    ListContacts {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    ListProposals {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

fn parse_contact_kind(raw: &str) -> Result<ContactKind, String> {
    ContactKind::ALL
        .into_iter()
        .find(|kind| kind.as_str() == raw)
        .ok_or_else(|| format!("expected one of: {}", choices(ContactKind::ALL.map(ContactKind::as_str))))
}

fn parse_budget(raw: &str) -> Result<BudgetBracket, String> {
    BudgetBracket::ALL
        .into_iter()
        .find(|budget| budget.as_str() == raw)
        .ok_or_else(|| format!("expected one of: {}", choices(BudgetBracket::ALL.map(BudgetBracket::as_str))))
}

fn choices(values: [&str; 4]) -> String {
    values.join(", ")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::SendContact {
            name,
            email,
            subject,
            kind,
            message,
        } => {
            let client = IntakeClient::new(&cli.server_url)?;
            let mut form = FormController::<ContactSubmission>::new();
            *form.draft_mut() = ContactSubmission {
                name,
                email,
                subject,
                kind,
                message,
            };
            send(&mut form, &client).await?;
        }
        Command::SendProposal {
            name,
            email,
            company,
            budget,
            deadline,
            description,
        } => {
            let client = IntakeClient::new(&cli.server_url)?;
            let mut form = FormController::<ProposalSubmission>::new();
            *form.draft_mut() = ProposalSubmission {
                name,
                email,
                company,
                budget,
                deadline,
                description,
            };
            send(&mut form, &client).await?;
        }
        Command::ListContacts { limit } => {
            let storage = Storage::new(&cli.database_url).await?;
            for row in storage.list_contacts(limit).await? {
                let contact = row.submission;
                println!(
                    "#{} {} [{}] {} <{}>: {}",
                    row.id,
                    row.created_at.to_rfc3339(),
                    contact.kind.as_str(),
                    contact.name,
                    contact.email,
                    contact.subject
                );
            }
        }
        Command::ListProposals { limit } => {
            let storage = Storage::new(&cli.database_url).await?;
            for row in storage.list_proposals(limit).await? {
                let proposal = row.submission;
                println!(
                    "#{} {} [{}] {} <{}> company={} deadline={}",
                    row.id,
                    row.created_at.to_rfc3339(),
                    proposal.budget.as_str(),
                    proposal.name,
                    proposal.email,
                    proposal.company.as_deref().unwrap_or("N/A"),
                    proposal.deadline
                );
            }
        }
    }

    Ok(())
}

async fn send<T>(form: &mut FormController<T>, client: &IntakeClient) -> Result<()>
where
    T: Submission + Default + Clone,
{
    let form_name = T::FORM.label();
    match form.submit(client).await {
        Ok(SubmissionResult::Accepted) => {
            println!("{form_name} submission accepted");
            Ok(())
        }
        Ok(SubmissionResult::Rejected(rejection)) => {
            print_field_errors(rejection.details.as_ref().unwrap_or(&FieldErrors::new()));
            bail!("{form_name} submission rejected: {}", rejection.error)
        }
        Ok(SubmissionResult::ServerError) => {
            bail!("{form_name} submission failed; the server could not be reached or errored")
        }
        Err(SubmitRefused::Invalid(err)) => {
            print_field_errors(&err.field_errors);
            bail!("{form_name} submission not sent: {err}")
        }
        Err(refused @ SubmitRefused::InFlight) => bail!(refused),
    }
}

fn print_field_errors(errors: &FieldErrors) {
    for (field, messages) in errors {
        for message in messages {
            eprintln!("  {field}: {message}");
        }
    }
}
