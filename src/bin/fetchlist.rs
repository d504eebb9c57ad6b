use anyhow::Result;
use fetchlist::cli::{self, CliArgs};
use fetchlist::client::AssumeOnline;
use fetchlist::config::Config;
use fetchlist::context::StandardContext;
use fetchlist::controller::FeedController;
use fetchlist::state::{FeedView, ViewState};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let args = match CliArgs::parse(env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            cli::print_help("fetchlist");
            std::process::exit(2);
        }
    };

    if args.help {
        cli::print_help("fetchlist");
        return Ok(());
    }

    let ctx = StandardContext::new(args.root.clone());
    if let Err(e) = fetchlist::logging::init(&ctx, args.log_level) {
        eprintln!("Logging disabled: {}", e);
    }

    let mut config = Config::load_or_default(&ctx)?;
    if let Some(url) = args.url {
        config.feed_url = url;
    }

    let (controller, mut completions) =
        FeedController::from_config(&config, Arc::new(AssumeOnline))?;
    let mut view = FeedView::new();

    if !args.json {
        println!("{}", view.state().status_line());
    }

    let run = controller.dispatch();
    view.begin(run.generation);

    while let Some(completion) = completions.recv().await {
        if view.apply(completion) {
            break;
        }
    }

    let state = view.state();
    if args.json {
        match state {
            ViewState::Populated { groups, .. } => {
                println!("{}", serde_json::to_string_pretty(groups)?)
            }
            ViewState::Empty => println!("{{}}"),
            _ => eprint!("{}", cli::render(state)),
        }
    } else {
        print!("{}", cli::render(state));
    }

    if matches!(state, ViewState::Error { .. }) {
        std::process::exit(1);
    }
    Ok(())
}
