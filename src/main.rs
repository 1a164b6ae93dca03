use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::filter::LevelFilter;

use zhaomu::platform::{self, HeadlessPlatform, Platform};
use zhaomu::proxy::{outcome_json, ProxyClient, WeatherLocation};
use zhaomu::rendering::{render_blocking, BlockGlyphs, CardRenderer};
use zhaomu::store::{Session, SupabaseStore};
use zhaomu::summary::{Enrichment, Note, Todo};
use zhaomu::time_filter::TimeFilter;
use zhaomu::{DailySummary, RenderedCard, ZhaomuConfig};

#[derive(Parser)]
#[command(name = "zhaomu", version, about = "朝暮记: daily share cards, todos and notes")]
struct Cli {
    /// JSON config file (environment variables still apply on top)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a card from a DailySummary JSON file
    Render(RenderArgs),
    /// Fetch today's todos, notes, weather and calendar, then render the card
    Today(TodayArgs),
    /// Current weather
    Weather(LocationArgs),
    /// Lunar calendar and almanac
    Calendar {
        /// Day to look up (YYYY-MM-DD), default today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Random picks from the discover feeds
    Discover {
        #[command(subcommand)]
        feed: Feed,
    },
    /// Manage todos
    Todos {
        #[command(flatten)]
        session: SessionArgs,
        #[command(subcommand)]
        action: TodoAction,
    },
    /// Manage notes
    Notes {
        #[command(flatten)]
        session: SessionArgs,
        #[command(subcommand)]
        action: NoteAction,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Directory the card is saved into
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Draw text as blocks instead of shaping with installed fonts
    #[arg(long)]
    block_glyphs: bool,
    /// Also print the card as a data URI
    #[arg(long)]
    data_uri: bool,
}

#[derive(Args)]
struct RenderArgs {
    /// DailySummary JSON
    input: PathBuf,
    /// Date used in the file name, default today
    #[arg(long)]
    date: Option<NaiveDate>,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct LocationArgs {
    #[arg(long, requires = "lon")]
    lat: Option<f64>,
    #[arg(long, requires = "lat")]
    lon: Option<f64>,
    /// Weather location id, used when no coordinates are given
    #[arg(long)]
    location: Option<String>,
}

#[derive(Args)]
struct SessionArgs {
    #[arg(long, env = "ZHAOMU_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,
    #[arg(long, env = "ZHAOMU_USER_ID")]
    user_id: Option<String>,
}

impl SessionArgs {
    fn session(&self) -> Option<Session> {
        match (&self.token, &self.user_id) {
            (Some(t), Some(u)) => Some(Session { access_token: t.clone(), user_id: u.clone() }),
            _ => None,
        }
    }
}

#[derive(Args)]
struct TodayArgs {
    #[command(flatten)]
    location: LocationArgs,
    #[command(flatten)]
    session: SessionArgs,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Subcommand)]
enum Feed {
    Movie,
    Music,
    Quote,
}

#[derive(Clone, Copy, ValueEnum)]
enum RangeArg {
    All,
    Today,
    Last7,
    Last30,
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long, value_enum, default_value = "today")]
    range: RangeArg,
    /// Custom range start (with --to)
    #[arg(long, requires = "to")]
    from: Option<NaiveDate>,
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,
}

impl FilterArgs {
    fn filter(&self) -> TimeFilter {
        if let (Some(start), Some(end)) = (self.from, self.to) {
            return TimeFilter::Custom { start, end };
        }
        match self.range {
            RangeArg::All => TimeFilter::All,
            RangeArg::Today => TimeFilter::Today,
            RangeArg::Last7 => TimeFilter::Last7,
            RangeArg::Last30 => TimeFilter::Last30,
        }
    }
}

#[derive(Subcommand)]
enum TodoAction {
    List(FilterArgs),
    Add { title: String },
    Done {
        id: i64,
        /// Mark as not done instead
        #[arg(long)]
        undo: bool,
    },
    Toggle { id: i64 },
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum NoteAction {
    List(FilterArgs),
    Add { content: String },
    Delete { id: i64 },
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::ERROR,
        (false, 0) => LevelFilter::INFO,
        (false, 1) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ZhaomuConfig> {
    let base = match path {
        Some(p) => ZhaomuConfig::from_file(p)?,
        None => ZhaomuConfig::default(),
    };
    Ok(base.with_env(|name| std::env::var(name).ok()))
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn render_card(config: &ZhaomuConfig, summary: DailySummary, block_glyphs: bool) -> zhaomu::Result<RenderedCard> {
    if block_glyphs {
        let renderer = CardRenderer::with_engine(BlockGlyphs::new())
            .layout(config.card.layout.clone())
            .theme(config.card.theme.clone());
        render_blocking(renderer, summary).await
    } else {
        let renderer = CardRenderer::new(&config.card)?;
        render_blocking(renderer, summary).await
    }
}

async fn deliver(config: &ZhaomuConfig, summary: DailySummary, date: NaiveDate, out: &OutputArgs) -> anyhow::Result<()> {
    let card = render_card(config, summary, out.block_glyphs)
        .await
        .map_err(|e| anyhow::anyhow!("{}: {}", e.user_message(), e))?;
    let path = platform::save_card(&card, &out.out_dir, date)?;
    println!("{}", path.display());
    println!("sha256 {}", card.digest());
    if let Some(notice) = &card.notice {
        eprintln!("{}", notice);
    }
    if out.data_uri {
        println!("{}", card.data_uri());
    }
    Ok(())
}

async fn weather_location(args: &LocationArgs) -> Option<WeatherLocation> {
    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        let host = HeadlessPlatform::with_position(platform::Coords { lat, lon });
        let port = host.geolocation();
        if let Some(c) = platform::locate(port.as_deref(), platform::DEFAULT_LOCATE_TIMEOUT).await {
            return Some(WeatherLocation::Coords(c));
        }
    }
    args.location.clone().map(WeatherLocation::Id)
}

fn open_store(config: &ZhaomuConfig, args: &SessionArgs) -> anyhow::Result<SupabaseStore> {
    let Some(session) = args.session() else {
        bail!("no session: pass --token and --user-id (or ZHAOMU_ACCESS_TOKEN / ZHAOMU_USER_ID)");
    };
    Ok(SupabaseStore::new(config, session)?)
}

async fn today(config: &ZhaomuConfig, args: TodayArgs) -> anyhow::Result<()> {
    let date = Local::now().date_naive();
    let proxy = ProxyClient::new(config)?;
    let location = weather_location(&args.location).await;

    let store = if config.store_configured() {
        args.session.session().map(|s| SupabaseStore::new(config, s)).transpose()?
    } else {
        None
    };
    if store.is_none() {
        log::warn!("no backend session; the card will show no todos or notes");
    }

    let records = async {
        match &store {
            Some(s) => {
                let (todos, notes) = futures::join!(s.list_todos(TimeFilter::Today), s.list_notes(TimeFilter::Today));
                (todos, notes)
            }
            None => (Ok(Vec::new()), Ok(Vec::new())),
        }
    };
    let ((todos, notes), weather, calendar) = futures::join!(
        records,
        proxy.weather_now(location.as_ref()),
        proxy.calendar(Some(date))
    );

    let todos: Vec<Todo> = todos.unwrap_or_else(|e| {
        eprintln!("待办获取失败: {}", e.user_message());
        Vec::new()
    });
    let notes: Vec<Note> = notes.unwrap_or_else(|e| {
        eprintln!("笔记获取失败: {}", e.user_message());
        Vec::new()
    });
    let weather = weather
        .map_err(|e| eprintln!("天气获取失败: {}", e.user_message()))
        .ok();
    let calendar = calendar
        .map_err(|e| eprintln!("万年历获取失败: {}", e.user_message()))
        .ok();

    let summary = DailySummary::from_records(date, &todos, &notes, config.share_url.clone(), Enrichment { weather, calendar });
    deliver(config, summary, date, &args.output).await
}

async fn todos(config: &ZhaomuConfig, session: &SessionArgs, action: TodoAction) -> anyhow::Result<()> {
    let store = open_store(config, session)?;
    let value = match action {
        TodoAction::List(f) => serde_json::to_value(store.list_todos(f.filter()).await?)?,
        TodoAction::Add { title } => serde_json::to_value(store.add_todo(&title).await?)?,
        TodoAction::Done { id, undo } => serde_json::to_value(store.set_todo_complete(id, !undo).await?)?,
        TodoAction::Toggle { id } => {
            let all = store.list_todos(TimeFilter::All).await?;
            let todo = all.iter().find(|t| t.id == id).with_context(|| format!("todo #{} not found", id))?;
            serde_json::to_value(store.toggle_todo(todo).await?)?
        }
        TodoAction::Delete { id } => serde_json::to_value(store.delete_todo(id).await?)?,
    };
    print_json(&value)
}

async fn notes(config: &ZhaomuConfig, session: &SessionArgs, action: NoteAction) -> anyhow::Result<()> {
    let store = open_store(config, session)?;
    let value = match action {
        NoteAction::List(f) => serde_json::to_value(store.list_notes(f.filter()).await?)?,
        NoteAction::Add { content } => serde_json::to_value(store.add_note(&content).await?)?,
        NoteAction::Delete { id } => serde_json::to_value(store.delete_note(id).await?)?,
    };
    print_json(&value)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Render(args) => {
            let raw = std::fs::read_to_string(&args.input)
                .with_context(|| format!("reading {}", args.input.display()))?;
            let summary: DailySummary = serde_json::from_str(&raw).context("parsing summary JSON")?;
            let date = args.date.unwrap_or_else(|| Local::now().date_naive());
            deliver(&config, summary, date, &args.output).await
        }
        Command::Today(args) => today(&config, args).await,
        Command::Weather(args) => {
            let proxy = ProxyClient::new(&config)?;
            let location = weather_location(&args).await;
            print_json(&outcome_json(&proxy.weather_now(location.as_ref()).await))
        }
        Command::Calendar { date } => {
            let proxy = ProxyClient::new(&config)?;
            print_json(&outcome_json(&proxy.calendar(date).await))
        }
        Command::Discover { feed } => {
            let proxy = ProxyClient::new(&config)?;
            match feed {
                Feed::Movie => print_json(&outcome_json(&proxy.trending_movie().await)),
                Feed::Music => print_json(&outcome_json(&proxy.trending_song().await)),
                Feed::Quote => {
                    let quote = proxy.daily_quote().await;
                    if let Ok(q) = &quote {
                        eprintln!("{}《{}》", q.author(), q.source());
                    }
                    print_json(&outcome_json(&quote))
                }
            }
        }
        Command::Todos { session, action } => todos(&config, &session, action).await,
        Command::Notes { session, action } => notes(&config, &session, action).await,
    }
}
