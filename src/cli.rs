use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;

use crate::engine::Config;

/// Command-line options for the simulator's HTTP driver.
///
/// Everything here seeds the engine's initial [`Config`]. `num_validators`
/// and `random_seed` are fixed for the process lifetime; the rest are
/// runtime-writable through the `config` facade operation.
#[derive(Debug, Parser)]
#[clap(version, about = "SSF/LMD-GHOST consensus research simulator")]
pub struct CliOpts {
  #[clap(long, help = "listen address of the HTTP facade", default_value = "127.0.0.1")]
  pub addr: IpAddr,

  #[clap(long, help = "listen port of the HTTP facade", default_value = "8080")]
  pub port: u16,

  #[clap(
    short,
    long,
    parse(from_occurrences),
    help = "use verbose output (-vv very verbose output)"
  )]
  pub verbose: u64,

  #[clap(long, help = "number of validators in the roster", default_value = "19")]
  pub num_validators: usize,

  #[clap(long, help = "slots per epoch", default_value = "8")]
  pub slots_per_epoch: u64,

  #[clap(long, help = "fraction of validators required to finalize a block", default_value = "0.6667")]
  pub quorum_ratio: f64,

  #[clap(long, help = "maximum vote delivery delay, in slots", default_value = "2")]
  pub max_delay_slots: u64,

  #[clap(long, help = "probability of a fork attack firing in attack mode", default_value = "0.12")]
  pub fork_attack_prob: f64,

  #[clap(long, help = "seed for the deterministic PRNG", default_value = "42")]
  pub random_seed: u64,
}

impl CliOpts {
  pub fn socket_addr(&self) -> SocketAddr {
    SocketAddr::new(self.addr, self.port)
  }

  pub fn engine_config(&self) -> Config {
    Config {
      num_validators: self.num_validators,
      slots_per_epoch: self.slots_per_epoch,
      quorum_ratio: self.quorum_ratio,
      max_delay_slots: self.max_delay_slots,
      fork_attack_prob: self.fork_attack_prob,
      random_seed: self.random_seed,
    }
  }
}

impl Default for CliOpts {
  fn default() -> Self {
    Self {
      addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
      port: 8080,
      verbose: 0,
      num_validators: 19,
      slots_per_epoch: 8,
      quorum_ratio: 2.0 / 3.0,
      max_delay_slots: 2,
      fork_attack_prob: 0.12,
      random_seed: 42,
    }
  }
}
