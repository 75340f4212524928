use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};

use erp_dashboard_lib::dialog::ConsoleDialog;
use erp_dashboard_lib::forms::{FormChoices, FormOutcome, ProductField, ProductForm};
use erp_dashboard_lib::logging::init_logging;
use erp_dashboard_lib::models::InventoryCategory;
use erp_dashboard_lib::options::OptionKind;
use erp_dashboard_lib::pages::{Notice, ProductEvent, ProductsPage};
use erp_dashboard_lib::table::{PageSize, RowAction, TablePresenter};
use erp_dashboard_lib::{AppConfig, Session};

#[derive(Parser, Debug)]
#[command(name = "erp-dashboard", version, about = "Inventory and sales dashboard client")]
struct Cli {
    /// Settings file; defaults to ./erp-dashboard.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(subcommand)]
    Products(ProductsCommand),

    #[command(subcommand)]
    Invoices(InvoicesCommand),

    /// Summary figures for the landing page.
    Dashboard,

    #[command(subcommand)]
    Options(OptionsCommand),
}

#[derive(Subcommand, Debug)]
enum ProductsCommand {
    List {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, value_enum, default_value = "direct")]
        category: Category,
    },

    /// Work-in-progress items.
    Wip {
        #[command(flatten)]
        view: ViewArgs,
    },

    Show {
        /// Row number on the listed page (1-based).
        row: usize,
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, value_enum, default_value = "direct")]
        category: Category,
    },

    /// Stores, units and inventory types the product form accepts.
    Choices,

    Create {
        /// Field assignments such as `name=Bolt` or `uom=pcs`.
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        fields: Vec<String>,
        #[arg(long, value_enum, default_value = "direct")]
        category: Category,
    },

    Edit {
        id: String,
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        fields: Vec<String>,
        #[arg(long, value_enum, default_value = "direct")]
        category: Category,
    },

    Delete {
        row: usize,
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, value_enum, default_value = "direct")]
        category: Category,
    },

    /// Sets current stock, e.g. `stock 64f1...=40`.
    Stock {
        #[arg(value_name = "ID=QTY", required = true)]
        changes: Vec<String>,
        #[arg(long, value_enum, default_value = "direct")]
        category: Category,
    },

    Export {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, value_enum, default_value = "direct")]
        category: Category,
        /// Ask the backend for its spreadsheet instead of writing CSV locally.
        #[arg(long)]
        server: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Bulk upload of a .csv or .xlsx file.
    Import {
        file: PathBuf,
        #[arg(long, value_enum, default_value = "direct")]
        category: Category,
    },

    /// Downloads the bulk upload template.
    Template {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum InvoicesCommand {
    List {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Renders the invoice PDF into the output directory.
    Download {
        id: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum OptionsCommand {
    List {
        #[arg(value_enum)]
        kind: OptionKindArg,
    },

    /// Prompts for a new value and adds it.
    Add {
        #[arg(value_enum)]
        kind: OptionKindArg,
    },
}

#[derive(Args, Debug, Default)]
struct ViewArgs {
    #[arg(long)]
    search: Option<String>,
    /// Column number to sort by (1-based); repeat to toggle direction.
    #[arg(long)]
    sort: Vec<usize>,
    #[arg(long, default_value_t = 1)]
    page: usize,
    /// 5, 10, 20, 50, 100 or all.
    #[arg(long)]
    page_size: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Category {
    Direct,
    Indirect,
}

impl From<Category> for InventoryCategory {
    fn from(c: Category) -> Self {
        match c {
            Category::Direct => InventoryCategory::Direct,
            Category::Indirect => InventoryCategory::Indirect,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OptionKindArg {
    Uom,
    InventoryType,
}

impl From<OptionKindArg> for OptionKind {
    fn from(k: OptionKindArg) -> Self {
        match k {
            OptionKindArg::Uom => OptionKind::Uom,
            OptionKindArg::InventoryType => OptionKind::InventoryType,
        }
    }
}

fn apply_view<T>(table: &mut TablePresenter<T>, view: &ViewArgs) -> anyhow::Result<()> {
    if let Some(raw) = &view.page_size {
        let size = PageSize::parse(raw).ok_or_else(|| anyhow!("unsupported page size `{raw}`"))?;
        table.set_page_size(size);
    }
    if let Some(query) = &view.search {
        table.set_search(query);
    }
    for column in &view.sort {
        if *column == 0 {
            bail!("columns are numbered from 1");
        }
        table.toggle_sort(column - 1);
    }
    table.set_page(view.page);
    Ok(())
}

fn check(notice: Option<&Notice>) -> anyhow::Result<()> {
    match notice {
        Some(n) if n.retryable => bail!("{} (try again)", n.message),
        Some(n) => bail!("{}", n.message),
        None => Ok(()),
    }
}

fn report(outcome: FormOutcome) -> anyhow::Result<()> {
    match outcome {
        FormOutcome::Saved { message } => {
            println!("{}", message.as_deref().unwrap_or("Saved"));
            Ok(())
        }
        FormOutcome::Invalid { field, message } => bail!("{field}: {message}"),
        FormOutcome::Failed { message } => bail!("{message}"),
    }
}

fn fill_form(form: &mut ProductForm, fields: &[String]) -> anyhow::Result<()> {
    for assignment in fields {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow!("expected FIELD=VALUE, got `{assignment}`"))?;
        let field = ProductField::parse(key.trim()).ok_or_else(|| anyhow!("unknown field `{key}`"))?;
        form.set(field, value);
    }
    Ok(())
}

/// Saves the form; an unknown unit or inventory type offers to add it and retries once.
async fn save_form(session: &Session, page: &mut ProductsPage, form: &mut ProductForm) -> anyhow::Result<()> {
    let mut outcome = page.save(form, session.options()).await;
    if let FormOutcome::Invalid { field, message } = &outcome {
        let dialog = ConsoleDialog;
        let added = match field.as_str() {
            "uom" => {
                eprintln!("{message}");
                form.add_uom(session.options(), &dialog).await?
            }
            "inventoryCategory" => {
                eprintln!("{message}");
                form.add_inventory_type(session.options(), &dialog).await?
            }
            _ => None,
        };
        if added.is_some() {
            outcome = page.save(form, session.options()).await;
        }
    }
    report(outcome)
}

async fn loaded_products(session: &Session, category: Category, view: &ViewArgs) -> anyhow::Result<ProductsPage> {
    let mut page = session.products(category.into());
    page.refresh().await;
    check(page.notice())?;
    apply_view(page.table_mut(), view)?;
    Ok(page)
}

async fn run_products(session: &Session, command: ProductsCommand) -> anyhow::Result<()> {
    let dialog = ConsoleDialog;
    match command {
        ProductsCommand::List { view, category } => {
            let page = loaded_products(session, category, &view).await?;
            print!("{}", page.table().view());
        }

        ProductsCommand::Wip { view } => {
            let mut page = session.wip();
            page.refresh().await;
            check(page.notice())?;
            apply_view(page.table_mut(), &view)?;
            print!("{}", page.table().view());
        }

        ProductsCommand::Show { row, view, category } => {
            let mut page = loaded_products(session, category, &view).await?;
            match page.act(RowAction::View, row.saturating_sub(1), &dialog).await {
                ProductEvent::Viewing(product) => println!("{}", serde_json::to_string_pretty(&product)?),
                ProductEvent::Failed(n) => check(Some(&n))?,
                _ => bail!("no product at row {row}"),
            }
        }

        ProductsCommand::Choices => {
            let choices = FormChoices::load(session.backend().as_ref(), session.options()).await?;
            println!("stores:");
            for store in &choices.stores {
                println!("  {}  {}", store.id, store.name);
            }
            println!("units: {}", choices.uoms.join(", "));
            println!("inventory types: {}", choices.inventory_types.join(", "));
        }

        ProductsCommand::Create { fields, category } => {
            let mut page = session.products(category.into());
            let mut form = ProductForm::create();
            form.set(ProductField::InventoryCategory, InventoryCategory::from(category).as_str());
            fill_form(&mut form, &fields)?;
            save_form(session, &mut page, &mut form).await?;
        }

        ProductsCommand::Edit { id, fields, category } => {
            let mut page = session.products(category.into());
            let mut form = ProductForm::edit(session.backend().as_ref(), &id).await?;
            fill_form(&mut form, &fields)?;
            save_form(session, &mut page, &mut form).await?;
        }

        ProductsCommand::Delete { row, view, category } => {
            let mut page = loaded_products(session, category, &view).await?;
            match page.request_delete(row.saturating_sub(1), &dialog).await {
                ProductEvent::Deleted => println!("Deleted"),
                ProductEvent::Cancelled => println!("Cancelled"),
                ProductEvent::Failed(n) => check(Some(&n))?,
                _ => bail!("no product at row {row}"),
            }
        }

        ProductsCommand::Stock { changes, category } => {
            let mut page = loaded_products(session, category, &ViewArgs::default()).await?;
            let mut form = page.stock_form();
            for change in &changes {
                let (id, qty) = change
                    .split_once('=')
                    .ok_or_else(|| anyhow!("expected ID=QTY, got `{change}`"))?;
                if !form.set(id.trim(), qty) {
                    bail!("no {} product with id `{id}`", page.category());
                }
            }
            report(page.save_stock(&mut form).await)?;
        }

        ProductsCommand::Export {
            view,
            category,
            server,
            out,
        } => {
            let dir = out.unwrap_or_else(|| session.output_dir().to_path_buf());
            let path = if server {
                session.products(category.into()).download_export(&dir).await?
            } else {
                let page = loaded_products(session, category, &view).await?;
                page.export_csv(&dir).await?
            };
            println!("{}", path.display());
        }

        ProductsCommand::Import { file, category } => {
            let mut page = session.products(category.into());
            let message = page.import(&file).await?;
            println!("{}", message.as_deref().unwrap_or("Uploaded"));
        }

        ProductsCommand::Template { out } => {
            let dir = out.unwrap_or_else(|| session.output_dir().to_path_buf());
            let path = session
                .products(InventoryCategory::Direct)
                .download_template(&dir)
                .await?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn run_invoices(session: &Session, command: InvoicesCommand) -> anyhow::Result<()> {
    let mut page = session.invoices();
    match command {
        InvoicesCommand::List { view } => {
            page.refresh().await;
            check(page.notice())?;
            apply_view(page.table_mut(), &view)?;
            print!("{}", page.table().view());
        }
        InvoicesCommand::Download { id, out } => {
            let dir = out.unwrap_or_else(|| session.output_dir().to_path_buf());
            let path = page
                .download_by_id(&id, &dir)
                .await
                .with_context(|| format!("downloading invoice {id}"))?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn run_options(session: &Session, command: OptionsCommand) -> anyhow::Result<()> {
    match command {
        OptionsCommand::List { kind } => {
            for value in session.options().list(kind.into()).await? {
                println!("{value}");
            }
        }
        OptionsCommand::Add { kind } => {
            match session.options().add_via_prompt(kind.into(), &ConsoleDialog).await? {
                Some(value) => println!("added {value}"),
                None => println!("Cancelled"),
            }
            if session.config().ui.options_db.is_none() {
                eprintln!("note: ui.options_db is not set, the value lasts for this run only");
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = AppConfig::load(cli.config.as_deref()).context("loading settings")?;
    let session = Session::connect(config)?;

    match cli.command {
        Command::Products(command) => run_products(&session, command).await?,
        Command::Invoices(command) => run_invoices(&session, command).await?,
        Command::Dashboard => {
            let mut page = session.dashboard();
            page.refresh().await;
            check(page.notice())?;
            if let Some(summary) = page.summary() {
                print!("{summary}");
            }
        }
        Command::Options(command) => run_options(&session, command).await?,
    }
    Ok(())
}
