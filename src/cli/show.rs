use anyhow::Result;
use clap::Parser;

use crate::cli::SubCommandExtend;
use crate::config::Opts;
use crate::store::EmbeddingStore;

#[derive(Parser, Debug, Clone)]
pub struct ShowCommand {
    /// 同时列出所有标识符
    #[arg(short, long)]
    pub list: bool,
}

impl SubCommandExtend for ShowCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let store = EmbeddingStore::load(opts.store_prefix())?;
        store.finalize()?;

        println!("记录数量: {}", store.size());
        if let Ok(d) = store.dimensionality() {
            println!("向量维度: {}", d);
        }
        for (identifier, count) in store.duplicate_identifiers() {
            println!("重复标识符: {} ({} 次)", identifier, count);
        }
        if self.list {
            for (i, entry) in store.entries().iter().enumerate() {
                println!("{}\t{}", i, entry.identifier);
            }
        }
        Ok(())
    }
}
