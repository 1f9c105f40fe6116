use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use lms_catalog::books::dto::BookDto;
use lms_catalog::catalog::domain::{BorrowOutcome, ReturnOutcome};
use lms_catalog::core::domain::Configuration;
use lms_catalog::core::library::LibraryResult;
use lms_catalog::core::logger::{Logger, TracingLogger};
use lms_catalog::session::Session;
use lms_catalog::utils::logs::{setup_json_tracing, setup_tracing};

const HELP: &str = "commands:
  register <user> <password> [admin]
  login <user> <password> | logout
  add <id>|<title>|<author>[|<isbn>|<pages>|<genre>|<summary>]
  borrow <id> | return <id>
  search <keyword>   (search worker)
  find <keyword>     (direct catalog lookup)
  books | authors | help | quit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let json = std::env::var("LMS_LOG_JSON").is_ok();
    if json {
        setup_json_tracing();
    } else {
        setup_tracing();
    }

    let config = Configuration::from_env("main");
    let logger: Arc<dyn Logger> = Arc::new(TracingLogger::new("catalog"));
    let mut session = Session::start(&config, logger).await?;

    let mut activity = session.subscribe_activity();
    let printer = tokio::spawn(async move {
        while let Some(event) = activity.recv().await {
            match event.to_json() {
                Ok(line) if json => println!("{}", line),
                _ => println!("* {}", event),
            }
        }
    });

    let shutdown = session.shutdown_token();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", HELP);
    let mut read_error = None;
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => {
                shutdown.cancel();
                Ok(None)
            }
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                read_error = Some(err);
                break;
            }
        };
        let (cmd, args) = match line.trim().split_once(' ') {
            Some((cmd, args)) => (cmd.to_string(), args.trim().to_string()),
            None => (line.trim().to_string(), "".to_string()),
        };
        if cmd == "quit" || cmd == "exit" {
            break;
        }
        if let Err(err) = dispatch(&mut session, cmd.as_str(), args.as_str()).await {
            if err.retryable() {
                println!("error: {} (try again)", err);
            } else {
                println!("error: {}", err);
            }
        }
    }

    session.shutdown().await?;
    let _ = printer.await;
    match read_error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

async fn dispatch(session: &mut Session, cmd: &str, args: &str) -> LibraryResult<()> {
    let words: Vec<&str> = args.split_whitespace().collect();
    match (cmd, words.as_slice()) {
        ("", _) => {}
        ("register", [user, password]) => session.register(user, password, false).await,
        ("register", [user, password, "admin"]) => session.register(user, password, true).await,
        ("login", [user, password]) => {
            let user = session.login(user, password)?;
            println!("welcome {}{}", user.username, if user.is_admin { " (admin)" } else { "" });
        }
        ("logout", _) => session.logout(),
        ("add", _) => match parse_book(args) {
            Some(book) => session.add_book(book).await?,
            None => println!("usage: add <id>|<title>|<author>[|<isbn>|<pages>|<genre>|<summary>]"),
        },
        ("borrow", [id]) => match session.borrow_book(id).await? {
            BorrowOutcome::Borrowed => println!("borrowed {}", id),
            BorrowOutcome::Unavailable(status) => println!("book {} is {}", id, status),
        },
        ("return", [id]) => match session.return_book(id).await? {
            ReturnOutcome::Returned => println!("returned {}", id),
            ReturnOutcome::NotBorrowed => println!("book {} is not on loan to you", id),
        },
        ("search", _) => {
            for entry in session.search(args).await? {
                println!("  {}", entry);
            }
        }
        ("find", _) => {
            for book in session.search_local(args) {
                println!("  {} [{}] {}", book.book_id, book.book_status, book.title);
            }
        }
        ("books", _) => {
            for book in session.store().list_books() {
                println!("  {} [{}] {} by {} (borrowed {}x)",
                         book.book_id, book.book_status, book.title, book.author, book.borrow_count);
            }
        }
        ("authors", _) => {
            for author in session.store().authors() {
                println!("  {}", author);
            }
        }
        _ => println!("{}", HELP),
    }
    Ok(())
}

fn parse_book(args: &str) -> Option<BookDto> {
    let fields: Vec<&str> = args.split('|').map(str::trim).collect();
    match fields.as_slice() {
        [id, title, author] if !id.is_empty() => Some(BookDto::new(id, title, author)),
        [id, title, author, isbn, pages, genre, rest @ ..] if !id.is_empty() => {
            let summary = rest.first().copied().filter(|s| !s.is_empty());
            Some(BookDto::new(id, title, author)
                .with_details(isbn, pages.parse().unwrap_or(0), genre, summary))
        }
        _ => None,
    }
}
