use clap::Args;
use std::path::PathBuf;

use crate::compositor;

#[derive(Args)]
pub struct ComposeCommand {
    /// Photo to place under the frame
    #[arg(long)]
    pub photo: PathBuf,

    /// Frame image; its dimensions become the output dimensions
    #[arg(long)]
    pub frame: PathBuf,

    /// Output PNG path
    #[arg(long, short, default_value = "framed.png")]
    pub out: PathBuf,

    /// Print a data URL instead of writing a file
    #[arg(long)]
    pub data_url: bool,
}

impl ComposeCommand {
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let photo = std::fs::read(&self.photo)?;
        let frame = std::fs::read(&self.frame)?;

        if self.data_url {
            println!("{}", compositor::compose_to_data_url(&photo, &frame)?);
        } else {
            let png = compositor::compose_to_png(&photo, &frame)?;
            std::fs::write(&self.out, png)?;
            println!("Wrote {}", self.out.display());
        }
        Ok(())
    }
}
