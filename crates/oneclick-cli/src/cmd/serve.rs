use std::path::Path;

pub fn run(root: &Path, port: u16, no_open: bool) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let root_buf = root.to_path_buf();

    rt.block_on(async move {
        tokio::select! {
            res = oneclick_server::serve(root_buf, port, !no_open) => res,
            _ = tokio::signal::ctrl_c() => Ok(()),
        }
    })
}
