use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use socialnet_core::config::Config;
use socialnet_core::logging::{init_logging_with_config, LogLevel};
use socialnet_core::model::{PostId, PostUpdate, UserId};
use socialnet_core::replica::ReplicaSet;
use socialnet_core::rpc::{RemoteNewsfeed, RemoteUserAndPost};
use socialnet_gateway::{
    Gateway, GatewayResult, PostDraft, ProfileEdit, Registration, Reply, Session,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "socialnet")]
#[command(author, version, about = "socialnet gateway", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Session id returned by `login` (the caller's user id)
    #[arg(short, long)]
    session: Option<i64>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<LogLevel>,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a new account
    CreateUser {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// Date of birth, YYYY-MM-DD
        #[arg(long)]
        dob: NaiveDate,
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Check credentials and print the session id
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Change profile fields of the session user
    EditUser {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        dob: Option<NaiveDate>,
        #[arg(long)]
        password: Option<String>,
    },

    /// Follow a user
    Follow { user_id: UserId },

    /// Stop following a user
    Unfollow { user_id: UserId },

    /// List followers of a user (default: the session user)
    Followers { user_id: Option<UserId> },

    /// List users a user follows (default: the session user)
    Following { user_id: Option<UserId> },

    /// Post operations
    #[command(subcommand)]
    Post(PostCommand),

    /// Print the newsfeed of a user (default: the session user)
    Feed { user_id: Option<UserId> },
}

#[derive(Subcommand, Debug)]
enum PostCommand {
    /// Publish a post as the session user
    Create {
        #[arg(long)]
        text: String,
        #[arg(long)]
        image: Option<String>,
        /// Create the post hidden
        #[arg(long)]
        hidden: bool,
    },

    /// Show a post with its likes and comments
    Get { post_id: PostId },

    /// Change fields of a post
    Edit {
        post_id: PostId,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        visible: Option<bool>,
    },

    /// Delete a post
    Delete { post_id: PostId },

    /// Like a post as the session user
    Like { post_id: PostId },

    /// Comment on a post as the session user
    Comment {
        post_id: PostId,
        #[arg(long)]
        text: String,
    },
}

type RemoteGateway = Gateway<ReplicaSet<RemoteUserAndPost>, ReplicaSet<RemoteNewsfeed>>;

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;
    let mut log_config = config.logging.log_config()?;
    if let Some(level) = args.log_level {
        log_config.level = level;
    }
    let log_config = log_config.json_format(args.json_logs || config.logging.json_format);
    init_logging_with_config(log_config)?;

    let gateway_config = &config.gateway;
    let options = gateway_config.dial_options();
    let users = ReplicaSet::<RemoteUserAndPost>::dial_user_and_post(
        &gateway_config.user_and_post_hosts,
        &options,
    )
    .context("Failed to reach the user-and-post service")?;
    let feed =
        ReplicaSet::<RemoteNewsfeed>::dial_newsfeed(&gateway_config.newsfeed_hosts, &options)
            .context("Failed to reach the newsfeed service")?;
    info!(
        user_and_post = users.len(),
        newsfeed = feed.len(),
        "gateway connected"
    );

    let gateway = Gateway::new(users, feed);
    let session = Session::from(args.session);

    let (body, code) = match run(&gateway, &session, args.command) {
        Ok(reply) => (serde_json::to_value(&reply)?, ExitCode::SUCCESS),
        Err(e) => {
            debug!(error = %e, "command failed");
            (serde_json::json!({ "message": e.to_string() }), e.exit_code())
        }
    };
    println!("{}", serde_json::to_string_pretty(&body)?);

    Ok(code)
}

fn run(gateway: &RemoteGateway, session: &Session, command: Command) -> GatewayResult<Reply> {
    match command {
        Command::CreateUser {
            first_name,
            last_name,
            dob,
            email,
            username,
            password,
        } => gateway.create_user(Registration {
            first_name,
            last_name,
            date_of_birth: dob,
            email,
            username,
            password,
        }),
        Command::Login { username, password } => gateway.login(&username, &password),
        Command::EditUser {
            first_name,
            last_name,
            dob,
            password,
        } => gateway.edit_user(
            session,
            ProfileEdit {
                first_name,
                last_name,
                date_of_birth: dob,
                password,
            },
        ),
        Command::Follow { user_id } => gateway.follow(session, user_id),
        Command::Unfollow { user_id } => gateway.unfollow(session, user_id),
        Command::Followers { user_id } => gateway.followers(session, user_id),
        Command::Following { user_id } => gateway.following(session, user_id),
        Command::Feed { user_id } => gateway.newsfeed(session, user_id),
        Command::Post(post) => run_post(gateway, session, post),
    }
}

fn run_post(
    gateway: &RemoteGateway,
    session: &Session,
    command: PostCommand,
) -> GatewayResult<Reply> {
    match command {
        PostCommand::Create {
            text,
            image,
            hidden,
        } => gateway.create_post(
            session,
            PostDraft {
                content_text: text,
                content_image_path: image,
                visible: !hidden,
            },
        ),
        PostCommand::Get { post_id } => gateway.get_post(post_id),
        PostCommand::Edit {
            post_id,
            text,
            image,
            visible,
        } => gateway.edit_post(
            session,
            post_id,
            PostUpdate {
                content_text: text,
                content_image_path: image,
                visible,
            },
        ),
        PostCommand::Delete { post_id } => gateway.delete_post(session, post_id),
        PostCommand::Like { post_id } => gateway.like_post(session, post_id),
        PostCommand::Comment { post_id, text } => gateway.comment_post(session, post_id, text),
    }
}
