use anyhow::Result;
use clap::Parser;
use fluvio_future::task::run_block_on;
use kyma_deploy::cli::KymaDeployCmd;

fn main() -> Result<()> {
    fluvio_future::subscriber::init_logger();
    let cmd = KymaDeployCmd::parse();

    run_block_on(cmd.process())
}
