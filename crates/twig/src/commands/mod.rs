use async_trait::async_trait;
use eyre::Result;

pub mod fork;
pub mod tree;

#[async_trait]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}
