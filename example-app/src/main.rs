//! # 运维命令行工具
//!
//! 在本地 JSON 文件存储上查看和修改配置覆盖值、模块和计数器。
//! 本进程视为受信任的本地调用方，使用进程内令牌通过操作令牌校验。

use anyhow::Context;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use config_abstractions::{
    Actor, ConfigProperty, NonEmptyValidator, RangeValidator, RegexValidator,
};
use config_impl::{StaticActionTokenVerifier, StaticPermissionGate};
use infrastructure_composition::{
    AdminInfrastructure, AdminScope, AdminSettings, LoggingConfig, StoreKind,
};
use module_abstractions::{Module, ModuleHooks, TabBinding};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// 本地调用方的操作令牌
const LOCAL_TOKEN: &str = "local-operator";

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "站点管理运维工具")]
struct Args {
    /// 运行参数文件路径，不存在时使用默认值
    #[arg(short, long, default_value = "config/admin.toml")]
    settings: PathBuf,

    /// 覆盖记录文件路径，优先于运行参数
    #[arg(long)]
    store: Option<PathBuf>,

    /// 操作者标识
    #[arg(long, default_value = "operator")]
    actor: String,

    /// 以命名空间作用域运行
    #[arg(long)]
    namespace: Option<String>,

    /// 日志级别
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 列出全部配置项
    List,
    /// 解析单个配置项
    Get { name: String },
    /// 写入生效覆盖值
    Override { name: String, value: String },
    /// 暂存草稿
    Draft { name: String, value: String },
    /// 提升草稿
    Promote { name: String },
    /// 删除覆盖值
    Reset { name: String },
    /// 列出模块
    Modules {
        /// 包含未启用的模块
        #[arg(long)]
        all: bool,
    },
    /// 启用模块并显示可达路由
    Enable { name: String },
    /// 停用模块并显示可达路由
    Disable { name: String },
    /// 显示计数器
    Counters,
}

struct ReportingHooks;

#[async_trait]
impl ModuleHooks for ReportingHooks {
    async fn on_enable(&self) -> anyhow::Result<()> {
        info!("报表模块启动");
        Ok(())
    }

    async fn on_disable(&self) -> anyhow::Result<()> {
        info!("报表模块停止");
        Ok(())
    }
}

/// 本工具管理的配置项
fn properties() -> anyhow::Result<Vec<ConfigProperty>> {
    Ok(vec![
        ConfigProperty::integer("max-items", 10, "Maximum number of items shown per page.")
            .with_validator(RangeValidator::between(1, 1000)),
        ConfigProperty::string("site-name", "Example", "Display name of the site.")
            .with_validator(NonEmptyValidator)
            .with_requires_restart(true),
        ConfigProperty::boolean(
            "maintenance-mode",
            false,
            "Reject non-admin requests while enabled.",
        ),
        ConfigProperty::text("motd", "", "Message of the day shown on the welcome page."),
        ConfigProperty::string("support-email", "ops@example.com", "Support contact address.")
            .with_validator(
                RegexValidator::new(r"^[^@\s]+@[^@\s]+$")
                    .context("support-email 校验规则无效")?,
            ),
    ])
}

fn reporting_module() -> Module {
    Module::new("reporting")
        .with_description("Scheduled usage reports")
        .with_global_route("/reports", "reports.list")
        .with_namespaced_route("/reports/mine", "reports.mine")
        .with_tab(TabBinding::new("analytics", "reports", "Reports"))
        .with_tab(
            TabBinding::new("analytics", "docs", "Report docs")
                .with_href("https://example.com/docs/reports")
                .with_target("_blank"),
        )
        .with_hooks(Arc::new(ReportingHooks))
}

async fn build_infrastructure(args: &Args) -> anyhow::Result<AdminInfrastructure> {
    let mut settings = if args.settings.exists() {
        AdminSettings::load(Some(args.settings.as_path()))
            .with_context(|| format!("加载运行参数失败: {}", args.settings.display()))?
    } else {
        AdminSettings::load(None).context("加载运行参数失败")?
    };
    if let Some(path) = &args.store {
        settings.store.kind = StoreKind::JsonFile;
        settings.store.path = Some(path.clone());
    } else if settings.store.kind == StoreKind::Memory {
        // 命令行每次运行都是新进程，内存存储没有意义
        settings.store.kind = StoreKind::JsonFile;
        settings.store.path = Some(PathBuf::from("admin-overrides.json"));
    }

    let mut logging = LoggingConfig::from_settings(&settings.logging)?;
    logging.level = args
        .log_level
        .parse()
        .with_context(|| format!("无效的日志级别: {}", args.log_level))?;

    let mut builder = AdminInfrastructure::builder()
        .with_settings(settings)
        .with_logging(logging)
        .with_permission_gate(Arc::new(StaticPermissionGate::new().with_admin(&args.actor)))
        .with_token_verifier(Arc::new(
            StaticActionTokenVerifier::new().with_shared_token(LOCAL_TOKEN),
        ))
        .with_module(reporting_module());
    for property in properties()? {
        builder = builder.with_property(property);
    }
    Ok(builder.build().await?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(infrastructure: &AdminInfrastructure, args: &Args) -> anyhow::Result<()> {
    let scope = match &args.namespace {
        Some(ns) => AdminScope::Namespace(ns.clone()),
        None => AdminScope::Global,
    };
    let console = infrastructure.console(scope);
    let actor = Actor::new(args.actor.clone());

    match &args.command {
        Command::List => print_json(&console.list_properties(&actor).await?)?,
        Command::Get { name } => {
            let value = console.resolve(&actor, name).await?;
            let record = console.get_override(&actor, name).await?;
            print_json(&serde_json::json!({
                "name": name,
                "value": value.value.to_raw(),
                "source": value.source,
                "override": record,
                "age_seconds": console.age_seconds(&actor).await?,
            }))?;
        }
        Command::Override { name, value } => {
            let version = console
                .override_property(&actor, name, value, LOCAL_TOKEN)
                .await?;
            println!("{} 已覆盖, 版本 {}", name, version);
        }
        Command::Draft { name, value } => {
            let version = console.save_draft(&actor, name, value, LOCAL_TOKEN).await?;
            println!("{} 草稿已保存, 版本 {}", name, version);
        }
        Command::Promote { name } => {
            let version = console.promote_draft(&actor, name, LOCAL_TOKEN).await?;
            println!("{} 草稿已生效, 版本 {}", name, version);
        }
        Command::Reset { name } => {
            let version = console.reset_property(&actor, name, LOCAL_TOKEN).await?;
            println!("{} 已重置, 版本 {}", name, version);
        }
        Command::Modules { all } => print_json(&console.list_modules(&actor, *all).await?)?,
        Command::Enable { name } => {
            let changed = console.enable_module(&actor, name, LOCAL_TOKEN).await?;
            println!("{} {}", name, if changed { "已启用" } else { "原本已启用" });
            print_json(&console.reachable_routes(&actor).await?)?;
        }
        Command::Disable { name } => {
            let changed = console.disable_module(&actor, name, LOCAL_TOKEN).await?;
            println!("{} {}", name, if changed { "已停用" } else { "原本已停用" });
            print_json(&console.reachable_routes(&actor).await?)?;
        }
        Command::Counters => {
            for sample in console.counters_snapshot(&actor).await? {
                println!("{:<28} {}", sample.name, sample.display_value());
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let infrastructure = build_infrastructure(&args).await?;
    infrastructure.start().await?;

    let result = run(&infrastructure, &args).await;
    infrastructure.stop().await?;
    result
}
