//! Menu-driven interactive shell
//!
//! Generic over its input and output so sessions can be scripted in tests.
//! Every question is driven by [`PromptState`]: input is read, validated, and
//! either accepted or rejected with a message and asked again.

use crate::backup::export_backup;
use crate::database::ProductStore;
use crate::error::{InventoryError, Result};
use crate::models::{Product, ProductRecord};
use crate::parsing::{parse_price, parse_quantity, today_midnight};
use crate::reconcile::{incoming_wins, reconcile, Outcome};
use chrono::NaiveDateTime;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Lifecycle of a single prompt
#[derive(Debug, PartialEq, Eq)]
pub enum PromptState<T> {
    AwaitingInput,
    Validating(String),
    Accepted(T),
    /// Message shown to the user before asking again
    Rejected(String),
}

/// Maps a validation result onto the prompt.
///
/// Errors the user can fix become a rejection with the given message;
/// storage faults are returned as errors.
fn validated<T>(
    result: Result<T>,
    message: impl FnOnce(&InventoryError) -> String,
) -> Result<PromptState<T>> {
    match result {
        Ok(value) => Ok(PromptState::Accepted(value)),
        Err(e) if e.is_recoverable() => Ok(PromptState::Rejected(message(&e))),
        Err(e) => Err(e),
    }
}

/// Menu entries in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    View,
    Add,
    Backup,
    Exit,
}

impl MenuAction {
    pub const ALL: [MenuAction; 4] = [
        MenuAction::View,
        MenuAction::Add,
        MenuAction::Backup,
        MenuAction::Exit,
    ];

    pub fn key(&self) -> char {
        match self {
            MenuAction::View => 'v',
            MenuAction::Add => 'a',
            MenuAction::Backup => 'b',
            MenuAction::Exit => 'e',
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MenuAction::View => "View details of a specific product.",
            MenuAction::Add => "Add a new product to the database.",
            MenuAction::Backup => "Make a backup of the entire contents of database.",
            MenuAction::Exit => "Exit the program.",
        }
    }

    /// Case-insensitive, surrounding whitespace ignored
    pub fn from_input(input: &str) -> Option<Self> {
        let input = input.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|action| input.len() == 1 && input.starts_with(action.key()))
    }
}

/// Whether the menu loop keeps going
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Interactive session over one store
pub struct Shell<'a, R, W> {
    store: &'a ProductStore,
    backup_path: PathBuf,
    input: R,
    output: W,
    today: fn() -> NaiveDateTime,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(store: &'a ProductStore, backup_path: impl Into<PathBuf>, input: R, output: W) -> Self {
        Self {
            store,
            backup_path: backup_path.into(),
            input,
            output,
            today: today_midnight,
        }
    }

    /// Replaces the clock used to date new entries
    pub fn with_clock(mut self, today: fn() -> NaiveDateTime) -> Self {
        self.today = today;
        self
    }

    /// Runs the menu loop until the user confirms exit or input ends.
    ///
    /// Storage faults end the session with an error.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let Some(action) = self.choose_action()? else {
                break;
            };
            let flow = match action {
                MenuAction::View => self.view_products()?,
                MenuAction::Add => self.add_products()?,
                MenuAction::Backup => self.backup()?,
                MenuAction::Exit => self.exit()?,
            };
            if flow == Flow::Exit {
                break;
            }
        }
        log::debug!("Shell session ended");
        Ok(())
    }

    fn choose_action(&mut self) -> Result<Option<MenuAction>> {
        let heading = "INVENTORY DATABASE MENU";
        let mut question = format!("\n{}\n{}\n", heading, "-".repeat(heading.len()));
        for action in MenuAction::ALL {
            question.push_str(&format!("{}) {}\n", action.key(), action.description()));
        }
        question.push_str("\nMenu Action: ");

        self.prompt(&question, |line| {
            Ok(match MenuAction::from_input(line) {
                Some(action) => PromptState::Accepted(action),
                None => PromptState::Rejected(
                    "\nInput Error. Please enter a valid letter per the list of menu options."
                        .to_string(),
                ),
            })
        })
    }

    fn view_products(&mut self) -> Result<Flow> {
        self.heading("View Product Details")?;
        let store = self.store;

        loop {
            let latest = match store.latest_id() {
                Ok(id) => id,
                Err(e) if e.is_recoverable() => {
                    writeln!(
                        self.output,
                        "There are no products in the database yet. Add or import some first."
                    )?;
                    return Ok(Flow::Continue);
                }
                Err(e) => return Err(e),
            };

            let question = format!("Enter Product ID to view details (1 - {}): ", latest);
            let Some(product) = self.prompt(&question, |line| {
                let Ok(id) = line.trim().parse::<i64>() else {
                    return Ok(PromptState::Rejected(
                        "\nEntry must be a numeric. Please try again.".to_string(),
                    ));
                };
                validated(store.find_by_id(id), |_| {
                    "\nThis Product ID does not exist. Please try again.".to_string()
                })
            })?
            else {
                return Ok(Flow::Exit);
            };

            self.print_product(&product)?;
            match self.confirm("\nWould you like to view more products (y/n): ")? {
                Some(true) => continue,
                Some(false) => return Ok(Flow::Continue),
                None => return Ok(Flow::Exit),
            }
        }
    }

    fn add_products(&mut self) -> Result<Flow> {
        loop {
            self.heading("Add A New Product")?;
            let Some(record) = self.read_new_product()? else {
                return Ok(Flow::Exit);
            };
            if self.store_new_product(&record)? == Flow::Exit {
                return Ok(Flow::Exit);
            }
            match self.confirm("\nWould you like to add another product (y/n): ")? {
                Some(true) => continue,
                Some(false) => return Ok(Flow::Continue),
                None => return Ok(Flow::Exit),
            }
        }
    }

    fn read_new_product(&mut self) -> Result<Option<ProductRecord>> {
        let Some(name) = self.prompt("Enter a product name: ", |line| {
            let name = line.trim();
            Ok(if name.is_empty() {
                PromptState::Rejected("Product Name is a required field.".to_string())
            } else {
                PromptState::Accepted(name.to_string())
            })
        })?
        else {
            return Ok(None);
        };

        let Some(price) = self.prompt("Enter a product price ($#.##): ", |line| {
            validated(parse_price(line).map_err(InventoryError::from), |e| e.to_string())
        })?
        else {
            return Ok(None);
        };

        let Some(quantity) = self.prompt("Enter a product quantity: ", |line| {
            validated(parse_quantity(line).map_err(InventoryError::from), |e| e.to_string())
        })?
        else {
            return Ok(None);
        };

        Ok(Some(ProductRecord {
            name,
            quantity,
            price,
            updated_at: (self.today)(),
        }))
    }

    fn store_new_product(&mut self, record: &ProductRecord) -> Result<Flow> {
        if let Some(existing) = self.store.find_by_name(&record.name)? {
            if !incoming_wins(record, &existing) {
                writeln!(
                    self.output,
                    "A product with the same name was added with a more recent Updated Date. \
                     Therefore, your entry was not added."
                )?;
                return Ok(Flow::Continue);
            }

            writeln!(self.output, "\nA product with this name already exists:")?;
            self.print_product(&existing)?;
            match self
                .confirm("Do you want to update this product with the details you entered? (y/n): ")?
            {
                Some(true) => {}
                Some(false) => {
                    writeln!(self.output, "This product was not updated in the database.")?;
                    return Ok(Flow::Continue);
                }
                None => return Ok(Flow::Exit),
            }
        }

        match reconcile(self.store, record) {
            Outcome::Inserted(id) => {
                let product = self.store.find_by_id(id)?;
                writeln!(self.output, "\nThis product has been added to the database.")?;
                self.print_product(&product)?;
            }
            Outcome::Updated(id) => {
                let product = self.store.find_by_id(id)?;
                writeln!(self.output, "\nThis product has been updated in the database.")?;
                self.print_product(&product)?;
            }
            Outcome::SkippedOlder => {
                writeln!(
                    self.output,
                    "A product with the same name was added with a more recent Updated Date. \
                     Therefore, your entry was not added."
                )?;
            }
            Outcome::Rejected(e) if e.is_recoverable() => {
                writeln!(self.output, "{}. Your entry was not added.", e)?;
            }
            Outcome::Rejected(e) => return Err(e),
        }
        Ok(Flow::Continue)
    }

    fn backup(&mut self) -> Result<Flow> {
        self.heading("Inventory Backup")?;
        let count = export_backup(self.store, &self.backup_path)?;
        writeln!(
            self.output,
            "A backup inventory file has been created ({} products): {}",
            count,
            self.backup_path.display()
        )?;
        Ok(Flow::Continue)
    }

    fn exit(&mut self) -> Result<Flow> {
        match self.confirm("Are you sure you want to exit the program? (y/n): ")? {
            Some(false) => Ok(Flow::Continue),
            Some(true) => {
                writeln!(self.output, "Goodbye.")?;
                Ok(Flow::Exit)
            }
            None => Ok(Flow::Exit),
        }
    }

    /// Asks until the answer is `y` or `n`. `None` when input ended.
    fn confirm(&mut self, question: &str) -> Result<Option<bool>> {
        self.prompt(question, |line| {
            Ok(match line.trim().to_lowercase().as_str() {
                "y" => PromptState::Accepted(true),
                "n" => PromptState::Accepted(false),
                _ => PromptState::Rejected("\nInvalid Entry. Please try again with 'y' or 'n'.".to_string()),
            })
        })
    }

    /// Drives one [`PromptState`] machine to completion.
    ///
    /// `validate` moves each line to `Accepted` or `Rejected`. Returns `None`
    /// when input ends before a value is accepted; errors from `validate`
    /// abort the prompt.
    fn prompt<T>(
        &mut self,
        question: &str,
        mut validate: impl FnMut(&str) -> Result<PromptState<T>>,
    ) -> Result<Option<T>> {
        let mut state = PromptState::AwaitingInput;
        loop {
            state = match state {
                PromptState::AwaitingInput => {
                    write!(self.output, "{}", question)?;
                    self.output.flush()?;
                    match self.read_line()? {
                        Some(line) => PromptState::Validating(line),
                        None => return Ok(None),
                    }
                }
                PromptState::Validating(line) => validate(&line)?,
                PromptState::Accepted(value) => return Ok(Some(value)),
                PromptState::Rejected(message) => {
                    writeln!(self.output, "{}", message)?;
                    PromptState::AwaitingInput
                }
            };
        }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn heading(&mut self, heading: &str) -> Result<()> {
        writeln!(self.output, "\n{}\n{}", heading, "-".repeat(heading.len()))?;
        Ok(())
    }

    fn print_product(&mut self, product: &Product) -> Result<()> {
        writeln!(self.output, "{}", product)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
