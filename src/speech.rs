use std::process::{Command, Stdio};

use crate::error::{Error, Result};
use crate::hw::Speaker;

/// Text-to-speech through an `espeak`-compatible command line
pub struct Espeak{
    program: String,
    args: Vec<String>,
}

impl Espeak{
    pub fn new(program: &str) -> Self{
        Espeak{
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: &[String]) -> Self{
        self.args = args.to_vec();
        self
    }

    pub fn program(&self) -> &str{
        &self.program
    }
}

impl Default for Espeak{
    fn default() -> Self{
        Espeak::new("espeak")
    }
}

impl Speaker for Espeak{
    fn say(&mut self, text: &str) -> Result<()>{
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| Error::Speech{ command: self.program.clone(), reason: e.to_string() })?;

        if !status.success(){
            return Err(Error::Speech{ command: self.program.clone(), reason: status.to_string() });
        }
        Ok(())
    }
}

/// Speaker for muted runs, only logs what would have been said
#[derive(Debug, Default)]
pub struct SilentSpeaker;

impl Speaker for SilentSpeaker{
    fn say(&mut self, text: &str) -> Result<()>{
        log::debug!("[TTS muted] {}", text);
        Ok(())
    }
}
