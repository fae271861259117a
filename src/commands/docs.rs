//! `nixkil docs` - browse the documentation corpus.

use crate::cli::{DocsAction, DocsCommand, GlobalArgs};
use nixkil::config::ToolConfig;
use nixkil::error::Result;
use nixkil::exit_codes;
use nixkil::knowledge::KnowledgeBase;

pub fn dispatch(global: &GlobalArgs, docs: DocsCommand) -> Result<i32> {
    let config = ToolConfig::resolve(global.config.as_deref())?;
    let kb = KnowledgeBase::from_config(&config)?;

    match docs.action {
        DocsAction::List(args) => {
            let names = match &args.category {
                Some(category) => kb.topics(category)?,
                None => kb.categories()?,
            };
            for name in names {
                println!("{}", name);
            }
        }
        DocsAction::Show(args) => {
            print!("{}", kb.read(&args.category, &args.topic)?);
        }
        DocsAction::Find(args) => {
            let found = kb.find(&args.pattern)?;
            if found.is_empty() {
                eprintln!("No topics match '{}'.", args.pattern);
            }
            for entry in found {
                println!("{}", entry);
            }
        }
    }

    Ok(exit_codes::SUCCESS)
}
