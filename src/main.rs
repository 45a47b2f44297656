use clap::{Args, Parser, Subcommand};
use log::{error, info};
use std::io::{self, Write};

use recipe_portal::fetcher::CollectionSource;
use recipe_portal::i18n::{message, Lang, Message};
use recipe_portal::modal::ExpandableText;
use recipe_portal::model::MessageContent;
use recipe_portal::pages::{self, EndpointSource, Listing, PageController, PageKind};
use recipe_portal::render::{ArticleCard, RecipeCard, RecipeDetail};
use recipe_portal::store::{
    Favorites, LanguagePreference, StateStore, MEDICAL_CHAT_KEY, WHAT_TO_COOK_CHAT_KEY,
};
use recipe_portal::view::{Listable, SortKey};
use recipe_portal::wizard::{ChatSession, RemoteChat, Wizard, WizardState};
use recipe_portal::{planner, ApiClient, FileStore, PortalConfig, PortalError};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Interface language (en or ar); remembered for later runs
    #[arg(long, global = true)]
    lang: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct ListArgs {
    /// Search in titles and descriptions
    #[arg(long)]
    query: Option<String>,
    #[arg(long)]
    category: Option<String>,
    /// none, cook-time, prep-time or read-time
    #[arg(long)]
    sort: Option<String>,
    #[arg(long, default_value_t = 1)]
    page: usize,
    /// Ask the backend to bypass its cache
    #[arg(long)]
    refresh: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    Recipes(ListArgs),
    Kids(ListArgs),
    Medical {
        #[command(flatten)]
        list: ListArgs,
        /// List the health conditions instead of recipes
        #[arg(long)]
        conditions: bool,
    },
    Magazine(ListArgs),
    Popular(ListArgs),
    Trending(ListArgs),
    /// Landing page sections
    Home,
    /// Show one recipe in full
    Show {
        id: String,
        /// Do not collapse long instructions
        #[arg(long)]
        full: bool,
    },
    /// Toggle a recipe in the favorites
    Favorite { id: String },
    /// Ask the health assistant
    Ask {
        message: Vec<String>,
        /// Forget the conversation first
        #[arg(long)]
        reset: bool,
    },
    /// Suggest a dish from the ingredients at hand
    Cook { ingredients: Vec<String> },
    /// Answer a few questions and get a generated recipe
    Generate,
    /// Weekly meal plan
    Plan {
        #[arg(long)]
        refresh: bool,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), PortalError> {
    let config = PortalConfig::load()?;
    let store = FileStore::open(&config.storage_dir)?;
    let lang = match cli.lang.as_deref() {
        Some(code) => {
            let lang = Lang::from_code(code);
            LanguagePreference::save(&store, lang)?;
            lang
        }
        None => LanguagePreference::load(&store, config.default_lang),
    };
    let client = ApiClient::new(&config)?;
    info!("Using {} ({})", config.base_url, lang);

    match cli.command {
        Command::Recipes(args) => list_recipes(&client, &config, &store, PageKind::Recipes, lang, args).await,
        Command::Kids(args) => list_recipes(&client, &config, &store, PageKind::KidsMeals, lang, args).await,
        Command::Medical { list, conditions } => {
            if conditions {
                for condition in pages::fetch_conditions(&client, lang).await? {
                    println!(
                        "{:<16} {}",
                        condition.id,
                        condition.name.get_or_empty(lang)
                    );
                }
                Ok(())
            } else {
                list_recipes(&client, &config, &store, PageKind::MedicalRecipes, lang, list).await
            }
        }
        Command::Magazine(args) => {
            let source = EndpointSource::articles(client.clone());
            let listing = load_listing(PageKind::Magazine, source, &config, lang, &args).await;
            print_listing(&listing, lang, |article| {
                let card = ArticleCard::new(article, lang);
                format!("{:<12} {}\n             {}", card.id, card.heading, card.excerpt)
            });
            Ok(())
        }
        Command::Popular(args) => list_recipes(&client, &config, &store, PageKind::PopularRecipes, lang, args).await,
        Command::Trending(args) => list_recipes(&client, &config, &store, PageKind::HeroTrending, lang, args).await,
        Command::Home => {
            let feed = pages::fetch_home(&client, lang).await;
            let favorites = Favorites::load(&store);
            if !feed.categories.is_empty() {
                println!("{}\n", feed.categories.join(" | "));
            }
            for (title, recipes) in [
                ("Featured", &feed.featured),
                ("Trending", &feed.trending),
                ("Popular", &feed.popular),
            ] {
                println!("== {title} ==");
                for recipe in recipes {
                    let card = RecipeCard::new(recipe, lang, favorites.contains(&recipe.id));
                    println!("{}", card_line(&card));
                }
            }
            Ok(())
        }
        Command::Show { id, full } => {
            let recipe = client.fetch_recipe(&id, lang).await?;
            let detail = RecipeDetail::new(&recipe, lang);
            if full || detail.steps.is_empty() {
                print!("{}", detail.to_text(lang));
            } else {
                let text = ExpandableText::new(detail.instructions_text(), config.collapsed_chars);
                let mut summary = detail.clone();
                summary.steps.clear();
                print!("{}", summary.to_text(lang));
                println!("\n{}", text.visible());
                if let Some(label) = text.toggle_label(lang) {
                    println!("({label}: --full)");
                }
            }
            Ok(())
        }
        Command::Favorite { id } => {
            let mut favorites = Favorites::load(&store);
            let added = favorites.toggle(&id)?;
            println!(
                "{} {} ({} saved)",
                if added { "+" } else { "-" },
                id,
                favorites.len()
            );
            Ok(())
        }
        Command::Ask { message, reset } => {
            let service = RemoteChat::health_assistant(client);
            let mut session = ChatSession::load(&store, MEDICAL_CHAT_KEY, config.chat_history_limit);
            if reset {
                session.clear()?;
            }
            if message.is_empty() {
                return Ok(());
            }
            let reply = session.send(&message.join(" "), &service, lang).await?;
            print_content(&reply.content, lang);
            Ok(())
        }
        Command::Cook { ingredients } => {
            let service = RemoteChat::what_to_cook(client);
            let mut session =
                ChatSession::load(&store, WHAT_TO_COOK_CHAT_KEY, config.chat_history_limit);
            let reply = session.send(&ingredients.join(", "), &service, lang).await?;
            print_content(&reply.content, lang);
            Ok(())
        }
        Command::Generate => generate(&client, lang).await,
        Command::Plan { refresh } => {
            let mut params = recipe_portal::LoadParams::new(lang);
            params.refresh = refresh;
            let days = planner::fetch_plan(&client, &params, &mut rand::thread_rng()).await?;
            for day in &days {
                println!("== {} ==", day.day);
                for meal in &day.meals {
                    let calories = meal
                        .recipe
                        .nutrition
                        .map(|n| format!("{} kcal", n.calories))
                        .unwrap_or_default();
                    println!(
                        "{:<10} {:<40} {}",
                        format!("{:?}", meal.slot),
                        meal.recipe.title.get(lang).unwrap_or_else(|| message(Message::Untitled, lang)),
                        calories
                    );
                }
                let totals = day.totals();
                let mut line = format!("total: {} kcal", totals.calories);
                if totals.estimated {
                    line.push_str(&format!(" ({})", message(Message::EstimatedNutrition, lang)));
                }
                println!("{line}\n");
            }
            Ok(())
        }
    }
}

async fn list_recipes(
    client: &ApiClient,
    config: &PortalConfig,
    store: &dyn StateStore,
    kind: PageKind,
    lang: Lang,
    args: ListArgs,
) -> Result<(), PortalError> {
    let source = EndpointSource::recipes(client.clone(), kind);
    let listing = load_listing(kind, source, config, lang, &args).await;
    let favorites = Favorites::load(store);
    print_listing(&listing, lang, |recipe| {
        card_line(&RecipeCard::new(recipe, lang, favorites.contains(&recipe.id)))
    });
    Ok(())
}

async fn load_listing<T, S>(
    kind: PageKind,
    source: S,
    config: &PortalConfig,
    lang: Lang,
    args: &ListArgs,
) -> Listing<T>
where
    T: Listable + Clone + Send,
    S: CollectionSource<T>,
{
    let mut page = PageController::new(kind, source, lang)
        .with_page_size(config.page_size)
        .with_category(args.category.clone());
    if args.refresh {
        page.refresh().await;
    } else {
        page.mount().await;
    }
    if let Some(query) = &args.query {
        page.set_query(query.as_str());
    }
    if let Some(sort) = args.sort.as_deref().and_then(SortKey::from_name) {
        page.set_sort(sort);
    }
    page.set_page(args.page);
    page.listing()
}

fn print_listing<T>(listing: &Listing<T>, lang: Lang, line: impl Fn(&T) -> String) {
    if let Some(error) = &listing.error {
        eprintln!("{error}");
        return;
    }
    if listing.items.is_empty() {
        println!("{}", message(Message::NoResults, lang));
        return;
    }
    for item in &listing.items {
        println!("{}", line(item));
    }
    println!(
        "\n{}/{} ({})",
        listing.page, listing.total_pages, listing.total
    );
}

fn card_line(card: &RecipeCard) -> String {
    let mut line = format!(
        "{} {:<10} {}",
        if card.favorite { "*" } else { " " },
        card.id,
        card.heading
    );
    if let Some(badge) = &card.badge {
        line.push_str(&format!(" [{badge}]"));
    }
    if let Some(time) = &card.time {
        line.push_str(&format!(" {time}"));
    }
    line
}

fn print_content(content: &MessageContent, lang: Lang) {
    match content {
        MessageContent::Text { text } => println!("{text}"),
        MessageContent::Recipe { recipe } => print!("{}", RecipeDetail::new(recipe, lang).to_text(lang)),
        MessageContent::Suggestions {
            recommended,
            avoid,
            note,
        } => {
            for item in recommended {
                println!("+ {item}");
            }
            for item in avoid {
                println!("- {item}");
            }
            if let Some(note) = note {
                println!("\n{note}");
            }
        }
    }
}

async fn generate(client: &ApiClient, lang: Lang) -> Result<(), PortalError> {
    let mut wizard = Wizard::recipe_generator();

    loop {
        match wizard.state().clone() {
            WizardState::Asking(index) => {
                if let Some(error) = wizard.error() {
                    eprintln!("{error}");
                }
                let Some(step) = wizard.current_step() else {
                    break;
                };
                print!(
                    "[{}/{}] {} ({}): ",
                    index + 1,
                    wizard.total_steps(),
                    step.key,
                    step.options.join(", ")
                );
                io::stdout().flush()?;
                let Some(line) = read_answer().await? else {
                    return Ok(());
                };
                if let Err(e) = wizard.answer(&line) {
                    eprintln!("{e}");
                }
            }
            WizardState::Ready => {
                // A failed submission re-asks the last question
                if let Ok(reply) = wizard.submit(client, lang).await {
                    print_content(&reply, lang);
                }
            }
            WizardState::Submitting | WizardState::Done(_) => break,
        }
    }
    Ok(())
}

/// Read one line off the runtime threads; `None` at end of input.
async fn read_answer() -> Result<Option<String>, PortalError> {
    let read = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        io::stdin().read_line(&mut line).map(|n| (n > 0).then_some(line))
    });
    read.await
        .map_err(|e| PortalError::Storage(e.to_string()))?
        .map_err(PortalError::from)
}
