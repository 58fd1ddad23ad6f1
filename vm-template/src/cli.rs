use crate::{
    loader::{read_template, TemplateLoader},
    model::ResolvedTemplate,
    vars::{references, Environment, VarSource},
};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vm_core::{vm_println, vm_success, vm_warning};

#[derive(Parser)]
#[command(name = "vm-template")]
#[command(about = "Resolve and validate VM provisioning templates")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve a template and print the result
    Render {
        /// Template file
        template: PathBuf,

        /// Override a field after parsing (repeatable), e.g. --set resource.ram=8GB
        #[arg(long = "set", value_name = "KEY.PATH=VALUE")]
        set: Vec<String>,

        /// Output format
        #[arg(short = 'f', long, default_value = "yaml")]
        format: OutputFormat,

        /// Ignore the process environment when resolving variables
        #[arg(long)]
        no_env: bool,
    },

    /// Check a template without printing it
    Validate {
        /// Template file
        template: PathBuf,

        /// Override a field after parsing (repeatable)
        #[arg(long = "set", value_name = "KEY.PATH=VALUE")]
        set: Vec<String>,

        /// Ignore the process environment when resolving variables
        #[arg(long)]
        no_env: bool,
    },

    /// List the variables a template references and where each resolves from
    Vars {
        /// Template file
        template: PathBuf,

        /// Ignore the process environment when resolving variables
        #[arg(long)]
        no_env: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Yaml,
    Json,
    JsonPretty,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            "json-pretty" => Ok(OutputFormat::JsonPretty),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

fn build_loader(set: Vec<String>, no_env: bool) -> TemplateLoader {
    let loader = TemplateLoader::new().with_overrides(set);
    if no_env {
        loader.with_environment(Environment::empty())
    } else {
        loader
    }
}

pub fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Render {
            template,
            set,
            format,
            no_env,
        } => {
            let resolved = build_loader(set, no_env).load(&template)?;
            output_template(&resolved, &format)?;
        }

        Command::Validate {
            template,
            set,
            no_env,
        } => {
            let document = build_loader(set, no_env).validate(&template)?;
            vm_success!(
                "{} is valid ({})",
                template.display(),
                document.kind()
            );
        }

        Command::Vars { template, no_env } => {
            let text = read_template(&template)?;
            let table = build_loader(Vec::new(), no_env).variables(&text);
            let refs = references(&text);

            for reference in &refs {
                let resolution = match (table.get(&reference.name), table.source(&reference.name)) {
                    (Some(value), Some(VarSource::Environment)) => {
                        format!("{:?} (environment)", value)
                    }
                    (Some(value), _) => format!("{:?} (vars)", value),
                    (None, _) => match &reference.default {
                        Some(default) => format!("{:?} (inline default)", default),
                        None => "MISSING".to_string(),
                    },
                };
                vm_println!("{} = {}", reference.name, resolution);
            }

            for name in table.declared().keys() {
                if !refs.iter().any(|r| &r.name == name) {
                    vm_warning!("{} is declared in vars but never referenced", name);
                }
            }
        }
    }

    Ok(())
}

fn output_template(resolved: &ResolvedTemplate, format: &OutputFormat) -> Result<()> {
    let value = resolved.to_value();
    match format {
        OutputFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&value)?;
            print!("{}", yaml);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string(&value)?;
            println!("{}", json);
        }
        OutputFormat::JsonPretty => {
            let json = serde_json::to_string_pretty(&value)?;
            println!("{}", json);
        }
    }
    Ok(())
}
