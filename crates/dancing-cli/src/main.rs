use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use dancing_client::models::{Comment, Post, RoomRequest, User, Video};
use dancing_client::{routes, Ack, ClientError, DancingClient, VideoUpload};
use dancing_config::{Config, ConfigManager};
use dancing_observability::LogManager;
use dancing_signaling::{ChannelConfig, PresenceNotice, SignalKind, SignalingChannel};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "dancing")]
#[command(about = "Command-line client for the Dancing video/social platform")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(long, env = "DANCING_CONFIG", default_value = "~/.dancing/config.json")]
    config: String,

    /// Override api.base_url for this run
    #[arg(long, env = "DANCING_API_URL")]
    api_url: Option<String>,

    /// Enable debug mode
    #[arg(long, short, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 配置管理命令
    Config(ConfigArgs),
    /// 注册新用户
    Register {
        username: String,
        password: String,
        email: String,
    },
    /// 登录并保存 token
    Login { username: String, password: String },
    /// 退出登录
    Logout,
    /// 查看当前用户
    Whoami,
    /// 更新用户信息
    Profile { username: String, email: String },
    /// 视频
    Videos(VideoArgs),
    /// 帖子
    Posts(PostArgs),
    /// 好友
    Friends(FriendArgs),
    /// 视频通话房间
    Call(CallArgs),
    /// 查看路由表，或解析一个路径
    Routes {
        /// 要解析的路径 (如: /videos/42)
        path: Option<String>,
    },
}

#[derive(Args, Clone)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// 获取配置值
    Get {
        /// 配置键 (如: api.base_url, signaling.endpoint)
        key: String,
    },
    /// 设置配置值
    Set {
        /// 配置键 (如: api.base_url, signaling.endpoint)
        key: String,
        /// 配置值
        value: String,
    },
    /// 初始化默认配置
    Init {
        /// 强制覆盖已有配置
        #[arg(long, default_value = "false")]
        force: bool,
    },
    /// 显示当前配置
    Show,
}

#[derive(Args, Clone)]
struct VideoArgs {
    #[command(subcommand)]
    command: VideoCommands,
}

#[derive(Subcommand, Clone)]
enum VideoCommands {
    List,
    Show { id: i64 },
    Mine,
    Search { keyword: String },
    Upload {
        path: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    Delete { id: i64 },
    /// 下载视频文件
    Download {
        id: i64,
        /// 保存路径，默认取 filePath 的文件名
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Clone)]
struct PostArgs {
    #[command(subcommand)]
    command: PostCommands,
}

#[derive(Subcommand, Clone)]
enum PostCommands {
    List,
    Show { id: i64 },
    Mine,
    ByUser { user_id: i64 },
    Search { keyword: String },
    Create { title: String, content: String },
    Update { id: i64, title: String, content: String },
    Delete { id: i64 },
    /// 点赞/取消点赞
    Like { id: i64 },
    /// 点赞用户列表
    Likes { id: i64 },
    /// 评论列表
    Comments { id: i64 },
    /// 发表评论
    Comment { id: i64, content: String },
    /// 删除自己的评论
    Uncomment { comment_id: i64 },
}

#[derive(Args, Clone)]
struct FriendArgs {
    #[command(subcommand)]
    command: FriendCommands,
}

#[derive(Subcommand, Clone)]
enum FriendCommands {
    /// 好友、收到的申请和发出的申请
    List,
    Pending,
    Search { keyword: String },
    Add { user_id: i64 },
    Accept { user_id: i64 },
    Reject { user_id: i64 },
    Remove { user_id: i64 },
}

#[derive(Args, Clone)]
struct CallArgs {
    #[command(subcommand)]
    command: CallCommands,
}

#[derive(Subcommand, Clone)]
enum CallCommands {
    /// 创建或加入房间，并在终端里收发信令
    Join {
        /// 已有房间 id；不填则新建
        #[arg(long)]
        room: Option<String>,
        /// 邀请的好友 id
        #[arg(long)]
        target: Option<i64>,
    },
    Info { room: String },
    Leave { room: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path =
        dancing_config::expand_tilde(&cli.config).unwrap_or_else(|| PathBuf::from(&cli.config));

    let command = match cli.command {
        Commands::Config(args) => return handle_config(args, config_path, cli.debug).await,
        command => command,
    };

    let manager = ConfigManager::load(&config_path).await?;
    let mut config = manager.snapshot().await;
    if let Some(url) = cli.api_url {
        config.set_value("api.base_url", &url)?;
        ConfigManager::validate(&config)?;
    }

    let mut logging = dancing_observability::LoggingConfig::from(&config.logging);
    if cli.debug {
        logging = logging.with_level("debug");
    }
    let _log = LogManager::new(&logging)?;

    if cli.debug {
        eprintln!("{}", format!("[DEBUG] Config path: {:?}", config_path).dimmed());
        eprintln!("{}", format!("[DEBUG] API: {}", config.api.base_url).dimmed());
    }

    let client = DancingClient::from_config(&config)?;
    tracing::debug!(
        "dancing-client {} against {}",
        dancing_client::VERSION,
        config.api.base_url
    );
    let result = run(command, &client, &config).await;

    if let Err(e) = &result {
        if let Some(ClientError::Unauthorized { message, .. }) = e.downcast_ref::<ClientError>() {
            println!("{}", format!("🔒 {}", message).red());
            println!("{}", "Run `dancing login <username> <password>` first".dimmed());
            return Ok(());
        }
    }
    result
}

async fn run(command: Commands, client: &DancingClient, config: &Config) -> anyhow::Result<()> {
    let session = client.session();

    match command {
        Commands::Config(_) => anyhow::bail!("config commands do not need a client"),
        Commands::Register {
            username,
            password,
            email,
        } => {
            let outcome = session.register(&username, &password, &email).await;
            print_outcome(outcome.success, &outcome.message);
        }
        Commands::Login { username, password } => {
            let outcome = session.login(&username, &password).await;
            print_outcome(outcome.success, &outcome.message);
            if let Some(user) = session.user() {
                println!("{}", format!("👤 {} (#{})", user.username, user.id).cyan());
            }
        }
        Commands::Logout => {
            session.logout().await;
            println!("{}", "👋 Logged out".cyan());
        }
        Commands::Whoami => match session.get_current_user().await {
            Some(user) => print_user(&user),
            None => println!("{}", "❌ Not logged in".red()),
        },
        Commands::Profile { username, email } => {
            let outcome = session.update_user(&username, &email).await;
            print_outcome(outcome.success, &outcome.message);
        }
        Commands::Videos(args) => handle_videos(args.command, client).await?,
        Commands::Posts(args) => handle_posts(args.command, client).await?,
        Commands::Friends(args) => handle_friends(args.command, client).await?,
        Commands::Call(args) => handle_call(args.command, client, config).await?,
        Commands::Routes { path } => show_routes(path.as_deref()),
    }

    Ok(())
}

async fn handle_config(args: ConfigArgs, config_path: PathBuf, debug: bool) -> anyhow::Result<()> {
    if debug {
        eprintln!("{}", format!("[DEBUG] Config path: {:?}", config_path).dimmed());
    }

    match args.command {
        ConfigCommands::Get { key } => {
            let manager = ConfigManager::load(&config_path).await?;
            let config = manager.snapshot().await;

            match config.get_value(&key) {
                Some(value) => {
                    println!("{}", format!("{} = {}", key, value).green());
                }
                None => {
                    println!("{}", format!("❌ Key not found: {}", key).red());
                    std::process::exit(1);
                }
            }
        }
        ConfigCommands::Set { key, value } => {
            let manager = ConfigManager::load(&config_path).await?;
            if let Err(e) = manager.update(|config| config.set_value(&key, &value)).await {
                eprintln!("{}", format!("❌ Failed to set value: {}", e).red());
                std::process::exit(1);
            }
            println!("{}", format!("✅ Set {} = {}", key, value).green());
        }
        ConfigCommands::Init { force } => {
            if config_path.exists() && !force {
                let notice = format!("⚠️  Config already exists at {:?}", config_path);
                println!("{}", notice.yellow());
                println!("{}", "Use --force to overwrite".dimmed());
                return Ok(());
            }

            dancing_config::init_dancing_dirs().await?;

            let manager = ConfigManager::new(Config::default(), config_path.clone());
            manager.save().await?;

            println!("{}", format!("✅ Config initialized at {:?}", config_path).green());
            println!("{}", "You can edit this file to customize your settings".dimmed());
        }
        ConfigCommands::Show => {
            let manager = ConfigManager::load(&config_path).await?;
            let config = manager.snapshot().await;

            println!("{}", "📋 Current Configuration:".cyan().bold());
            println!();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

async fn handle_videos(command: VideoCommands, client: &DancingClient) -> anyhow::Result<()> {
    let videos = client.videos();

    match command {
        VideoCommands::List => print_videos(&videos.list().await?.into_data()?),
        VideoCommands::Mine => print_videos(&videos.mine().await?.into_data()?),
        VideoCommands::Search { keyword } => {
            print_videos(&videos.search(&keyword).await?.into_data()?)
        }
        VideoCommands::Show { id } => {
            let video = videos.detail(id).await?.into_data()?;
            println!("{}", serde_json::to_string_pretty(&video)?);
        }
        VideoCommands::Upload {
            path,
            title,
            description,
        } => {
            println!("{}", format!("🚀 Uploading {:?}", path).cyan());
            let upload = VideoUpload::from_path(&path, title, description).await?;
            print_ack(videos.upload(upload).await?);
        }
        VideoCommands::Delete { id } => print_ack(videos.delete(id).await?),
        VideoCommands::Download { id, output } => {
            let video = videos.detail(id).await?.into_data()?;
            let file_path = video
                .file_path
                .ok_or_else(|| anyhow::anyhow!("Video {} has no file", id))?;
            let output = output.unwrap_or_else(|| {
                PathBuf::from(file_path.rsplit(['/', '\\']).next().unwrap_or(&file_path))
            });

            println!("{}", format!("⬇️  Downloading {}", video.title).cyan());
            let bytes = videos.download(&file_path).await?;
            tokio::fs::write(&output, &bytes).await?;
            println!(
                "{}",
                format!("✅ Saved {} bytes to {:?}", bytes.len(), output).green()
            );
        }
    }
    Ok(())
}

async fn handle_posts(command: PostCommands, client: &DancingClient) -> anyhow::Result<()> {
    let posts = client.posts();

    match command {
        PostCommands::List => print_posts(&posts.list().await?.into_data()?),
        PostCommands::Mine => print_posts(&posts.mine().await?.into_data()?),
        PostCommands::ByUser { user_id } => {
            print_posts(&posts.by_user(user_id).await?.into_data()?)
        }
        PostCommands::Search { keyword } => {
            print_posts(&posts.search(&keyword).await?.into_data()?)
        }
        PostCommands::Show { id } => {
            let post = posts.detail(id).await?.into_data()?;
            let author = post.username.as_deref().unwrap_or("?");
            println!("{}", post.title.cyan().bold());
            println!("{}", format!("by {} · ❤ {}", author, post.likes_count).dimmed());
            println!();
            println!("{}", post.content);
        }
        PostCommands::Create { title, content } => print_ack(posts.create(&title, &content).await?),
        PostCommands::Update { id, title, content } => {
            print_ack(posts.update(id, &title, &content).await?)
        }
        PostCommands::Delete { id } => print_ack(posts.delete(id).await?),
        PostCommands::Like { id } => print_ack(posts.toggle_like(id).await?),
        PostCommands::Likes { id } => print_users(&posts.likes(id).await?.into_data()?),
        PostCommands::Comments { id } => print_comments(&posts.comments(id).await?.into_data()?),
        PostCommands::Comment { id, content } => print_ack(posts.comment(id, &content).await?),
        PostCommands::Uncomment { comment_id } => {
            print_ack(posts.delete_comment(comment_id).await?)
        }
    }
    Ok(())
}

async fn handle_friends(command: FriendCommands, client: &DancingClient) -> anyhow::Result<()> {
    let friends = client.friends();

    match command {
        FriendCommands::List => {
            let overview = friends.overview().await?.into_data()?;
            println!("{}", "👥 Friends".cyan().bold());
            print_users(&overview.friends);
            println!("{}", format!("📥 Pending ({})", overview.pending_count).cyan().bold());
            print_users(&overview.pending_requests);
            println!("{}", "📤 Sent".cyan().bold());
            print_users(&overview.sent_requests);
        }
        FriendCommands::Pending => print_users(&friends.pending().await?.into_data()?),
        FriendCommands::Search { keyword } => {
            print_users(&friends.search(&keyword).await?.into_data()?)
        }
        FriendCommands::Add { user_id } => print_ack(friends.send_request(user_id).await?),
        FriendCommands::Accept { user_id } => print_ack(friends.accept(user_id).await?),
        FriendCommands::Reject { user_id } => print_ack(friends.reject(user_id).await?),
        FriendCommands::Remove { user_id } => print_ack(friends.delete(user_id).await?),
    }
    Ok(())
}

async fn handle_call(
    command: CallCommands,
    client: &DancingClient,
    config: &Config,
) -> anyhow::Result<()> {
    let calls = client.video_call();

    match command {
        CallCommands::Info { room } => {
            let info = calls.room(&room).await?.into_data()?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        CallCommands::Leave { room } => print_ack(calls.leave_room(&room).await?),
        CallCommands::Join { room, target } => {
            let request = RoomRequest {
                room_id: room,
                target_user_id: target,
            };
            let joined = calls.create_room(&request).await?.into_data()?;
            let role = if joined.is_creator { "creator" } else { "guest" };
            println!(
                "{}",
                format!("📞 Room {} as {} ({})", joined.room_id, joined.username, role).green()
            );

            let token = client
                .transport()
                .stored_token()
                .await
                .ok_or_else(|| anyhow::anyhow!("No stored token, log in first"))?;

            let channel = SignalingChannel::new(ChannelConfig::from(&config.signaling));
            channel.connect(&token).await?;

            let me = joined.user_id;
            let subscribed = channel.subscribe_to_room(&joined.room_id, move |message| {
                print_signal(me, &message);
            });
            if subscribed.is_none() {
                channel.disconnect();
                print_ack(calls.leave_room(&joined.room_id).await?);
                anyhow::bail!("Failed to subscribe to room {}", joined.room_id);
            }
            channel.send_signal(
                &joined.room_id,
                serde_json::json!({
                    "type": "user-joined",
                    "userId": joined.user_id,
                    "username": joined.username,
                }),
            );

            println!("{}", "Type JSON or text to signal, '/quit' to leave".dimmed());
            let result = signal_loop(&channel, &joined.room_id).await;

            channel.disconnect();
            print_ack(calls.leave_room(&joined.room_id).await?);
            result?;
        }
    }
    Ok(())
}

async fn signal_loop(channel: &SignalingChannel, room_id: &str) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "/quit" || line == "/exit" {
                    break;
                }

                let payload = serde_json::from_str(line)
                    .unwrap_or_else(|_| serde_json::json!({"type": "chat", "text": line}));
                if !channel.send_signal(room_id, payload) {
                    println!("{}", "❌ Signaling channel is down".red());
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

fn print_signal(me: i64, message: &serde_json::Value) {
    if message.get("userId").and_then(|v| v.as_i64()) == Some(me) {
        return;
    }

    match SignalKind::of(message) {
        SignalKind::UserJoined | SignalKind::UserLeft => {
            if let Some(notice) = PresenceNotice::from_value(message) {
                println!("{}", format!("🔔 {} {}", notice.username, notice.kind).yellow());
            }
        }
        SignalKind::Other(kind) if kind == "chat" => {
            let text = message.get("text").and_then(|v| v.as_str()).unwrap_or_default();
            println!("{} {}", "💬".cyan(), text);
        }
        kind => println!("{}", format!("📡 {:?}: {}", kind, message).dimmed()),
    }
}

fn show_routes(path: Option<&str>) {
    match path {
        Some(path) => match routes::resolve(path) {
            Some(m) => {
                println!(
                    "{}",
                    format!("{} → {} ({})", path, m.entry.view, m.entry.name).green()
                );
                for (name, value) in &m.params {
                    println!("  :{} = {}", name, value);
                }
                if m.entry.requires_auth {
                    println!("{}", "  🔒 requires login".yellow());
                }
            }
            None => println!("{}", format!("❌ No route matches {}", path).red()),
        },
        None => {
            for entry in routes::ROUTES {
                let lock = if entry.requires_auth { "🔒" } else { "  " };
                println!("{} {:<18} {:<14} {}", lock, entry.path, entry.name, entry.view);
            }
        }
    }
}

fn print_outcome(success: bool, message: &str) {
    if success {
        println!("{}", format!("✅ {}", message).green());
    } else {
        println!("{}", format!("❌ {}", message).red());
    }
}

fn print_ack(ack: Ack) {
    print_outcome(ack.is_success(), &ack.message);
}

fn print_user(user: &User) {
    println!(
        "{} {}",
        format!("#{}", user.id).dimmed(),
        user.username.cyan().bold()
    );
    if let Some(email) = &user.email {
        println!("   {}", email);
    }
}

fn print_users(users: &[User]) {
    if users.is_empty() {
        println!("{}", "   (none)".dimmed());
    }
    for user in users {
        print_user(user);
    }
}

fn print_videos(videos: &[Video]) {
    if videos.is_empty() {
        println!("{}", "(no videos)".dimmed());
    }
    for video in videos {
        println!(
            "{} {} {}",
            format!("#{:<5}", video.id).dimmed(),
            video.title.cyan(),
            video
                .uploader_name
                .as_deref()
                .map(|name| format!("by {}", name))
                .unwrap_or_default()
                .dimmed()
        );
    }
}

fn print_posts(posts: &[Post]) {
    if posts.is_empty() {
        println!("{}", "(no posts)".dimmed());
    }
    for post in posts {
        let liked = if post.is_liked { "♥" } else { "♡" };
        println!(
            "{} {} {}",
            format!("#{:<5}", post.id).dimmed(),
            post.title.cyan(),
            format!("{} {}", liked, post.likes_count).dimmed()
        );
    }
}

fn print_comments(comments: &[Comment]) {
    if comments.is_empty() {
        println!("{}", "(no comments)".dimmed());
    }
    for comment in comments {
        let when = comment
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{} {} {}",
            format!("#{:<5}", comment.id).dimmed(),
            comment.content,
            when.dimmed()
        );
    }
}
