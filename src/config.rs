use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use clap::{Parser, Subcommand};
use directories::ProjectDirs;

use crate::cli::*;

static CONF_DIR: LazyLock<ConfDir> = LazyLock::new(|| {
    let proj_dirs =
        ProjectDirs::from("", "lookalike", "lookalike").expect("failed to get project dir");
    ConfDir { path: proj_dirs.data_dir().to_path_buf() }
});

fn default_config_dir() -> &'static str {
    CONF_DIR.path().to_str().unwrap()
}

#[derive(Parser, Debug, Clone)]
pub struct EncoderOptions {
    /// 缩略图边长，向量维度为边长的平方乘以 3
    #[arg(long, value_name = "N", default_value_t = 16)]
    pub thumbnail_size: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    /// 显示的结果数量
    #[arg(long, value_name = "COUNT", default_value_t = 1)]
    pub count: usize,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "lookalike", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// 数据目录
    #[arg(short, long, default_value = default_config_dir())]
    pub conf_dir: ConfDir,
    /// 向量库文件前缀，默认为 <CONF_DIR>/embeddings
    #[arg(short, long, value_name = "PREFIX")]
    pub store: Option<PathBuf>,
}

impl Opts {
    /// 向量库文件前缀
    pub fn store_prefix(&self) -> PathBuf {
        self.store.clone().unwrap_or_else(|| self.conf_dir.store_prefix())
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 扫描图片目录，生成向量库
    Build(BuildCommand),
    /// 在向量库中搜索最相似的图片
    Search(SearchCommand),
    /// 启动 HTTP 搜索服务
    Server(ServerCommand),
    /// 显示向量库信息
    Show(ShowCommand),
}

#[derive(Debug, Clone)]
pub struct ConfDir {
    path: PathBuf,
}

impl ConfDir {
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// 默认向量库文件前缀
    pub fn store_prefix(&self) -> PathBuf {
        self.path.join("embeddings")
    }
}

impl FromStr for ConfDir {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self { path: PathBuf::from(s) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_flag_overrides_conf_dir() {
        let opts = Opts::parse_from(["lookalike", "-c", "/data", "show"]);
        assert_eq!(opts.store_prefix(), PathBuf::from("/data/embeddings"));

        let opts = Opts::parse_from(["lookalike", "-c", "/data", "-s", "/other/db", "show"]);
        assert_eq!(opts.store_prefix(), PathBuf::from("/other/db"));
    }
}
