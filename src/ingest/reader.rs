//! Double-buffered line reader.
//!
//! In parallel mode a dedicated reader thread fills line blocks and hands
//! them over a bounded channel of capacity one: while the caller parses
//! block `k`, the reader is already filling block `k + 1`. Receiving is the
//! completion wait, the hand-off the buffer swap. With a single thread the
//! next block is read synchronously on the caller.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};

use crate::error::PoolError;
use crate::utils::Parallelism;

pub(crate) struct BlockReader {
    source: BlockSource,
    parse_buffer: Vec<String>,
    path: PathBuf,
}

enum BlockSource {
    Sequential {
        reader: BufReader<File>,
        block_size: usize,
    },
    Pipelined {
        next_block: Receiver<io::Result<Vec<String>>>,
    },
}

impl BlockReader {
    /// Take over `reader` (positioned after any header line) and start the
    /// first block read.
    pub(crate) fn new(
        mut reader: BufReader<File>,
        block_size: usize,
        parallelism: Parallelism,
        path: PathBuf,
    ) -> Self {
        debug_assert!(block_size > 0, "block size must be positive");
        let source = match parallelism {
            Parallelism::Sequential => BlockSource::Sequential { reader, block_size },
            Parallelism::Parallel => {
                let (sender, next_block) = mpsc::sync_channel(1);
                std::thread::spawn(move || loop {
                    match read_block_lines(&mut reader, block_size) {
                        Ok(lines) => {
                            let at_eof = lines.is_empty();
                            if sender.send(Ok(lines)).is_err() || at_eof {
                                break;
                            }
                        }
                        Err(e) => {
                            let _ = sender.send(Err(e));
                            break;
                        }
                    }
                });
                BlockSource::Pipelined { next_block }
            }
        };
        BlockReader {
            source,
            parse_buffer: Vec::new(),
            path,
        }
    }

    /// Swap the next block in. Returns `false` once the input is exhausted.
    pub(crate) fn read_block(&mut self) -> Result<bool, PoolError> {
        let block = match &mut self.source {
            BlockSource::Sequential { reader, block_size } => {
                read_block_lines(reader, *block_size)
                    .map_err(|e| PoolError::io(self.path.clone(), e))?
            }
            BlockSource::Pipelined { next_block } => match next_block.recv() {
                Ok(result) => result.map_err(|e| PoolError::io(self.path.clone(), e))?,
                // Reader thread already delivered its final block.
                Err(_) => Vec::new(),
            },
        };
        self.parse_buffer = block;
        Ok(!self.parse_buffer.is_empty())
    }

    /// Lines of the current block.
    pub(crate) fn lines(&self) -> &[String] {
        &self.parse_buffer
    }
}

pub(crate) fn trim_line_ending(line: &mut String) {
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
}

fn read_block_lines(reader: &mut BufReader<File>, block_size: usize) -> io::Result<Vec<String>> {
    let mut lines = Vec::new();
    let mut line = String::new();
    while lines.len() < block_size {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        trim_line_ending(&mut line);
        lines.push(std::mem::take(&mut line));
    }
    Ok(lines)
}
