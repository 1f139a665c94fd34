//! Command implementations for the `mcall` binary

use crate::{
    cli::args::{CallArgs, EchoArgs, HelloArgs, RunArgs, ServeArgs, SizeArgs},
    config::Config,
    core::Registry,
    error::Result,
    rpc::{self, Handler, UnixRpcServer},
    utils::{fs::FileSystemUtils, process::Cmd},
};
use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Receiver shared by every `mcall` command
#[derive(Debug, Default)]
pub struct Toolbox {
    greetings: u32,
    fs_utils: FileSystemUtils,
}

/// Request answered by `mcall sv`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NameRequest {
    pub name: String,
}

/// Reply sent by `mcall sv`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NameReply {
    pub len: usize,
}

/// Measures the names it is sent
pub struct NameLength;

impl Handler for NameLength {
    type Arg = NameRequest;
    type Reply = NameReply;

    fn handle(&self, arg: NameRequest) -> NameReply {
        NameReply {
            len: arg.name.chars().count(),
        }
    }
}

/// Build the `mcall` command table
pub fn build_registry(config: &Config) -> Result<Registry<Toolbox>> {
    let mut registry = Registry::builder(Toolbox::default())
        .op("Hello", Toolbox::hello)
        .op("EC_Echo", Toolbox::echo)
        .op("SZ_Size", Toolbox::size)
        .op("RN_Run", Toolbox::run)
        .op("SV_Serve", Toolbox::serve)
        .op("CL_Call", Toolbox::call)
        .installer(config.installer.clone())
        .build()?;

    registry.add("version", |_: &mut Toolbox, _: &[String]| {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        Ok(())
    })?;

    Ok(registry)
}

impl Toolbox {
    pub fn greetings(&self) -> u32 {
        self.greetings
    }

    fn hello(&mut self, args: &[String]) -> anyhow::Result<()> {
        let args = HelloArgs::parse_from(args);
        self.greetings += 1;
        println!("hello, {}", args.name);
        Ok(())
    }

    fn echo(&mut self, args: &[String]) -> anyhow::Result<()> {
        let args = EchoArgs::parse_from(args);
        let line = args.words.join(" ");
        if args.no_newline {
            print!("{line}");
        } else {
            println!("{line}");
        }
        Ok(())
    }

    fn size(&mut self, args: &[String]) -> anyhow::Result<()> {
        let args = SizeArgs::parse_from(args);
        for path in &args.paths {
            match self.fs_utils.file_size(path)? {
                Some(size) => println!("{}\t{}", size, path.display()),
                None => println!("missing\t{}", path.display()),
            }
        }
        Ok(())
    }

    #[instrument(skip(self))]
    fn run(&mut self, args: &[String]) -> anyhow::Result<()> {
        let args = RunArgs::parse_from(args);
        let (program, rest) = args
            .command
            .split_first()
            .context("no command to run")?;

        let cmd = Cmd::new(program.clone(), rest.iter().cloned())
            .silent(args.silent)
            .trace();
        if args.capture {
            print!("{}", cmd.stdout()?);
        } else {
            cmd.run()?;
        }
        Ok(())
    }

    fn serve(&mut self, args: &[String]) -> anyhow::Result<()> {
        let args = ServeArgs::parse_from(args);
        let server = UnixRpcServer::bind(&args.socket, NameLength)?;
        if args.once {
            server.serve_one()?;
            info!("Served one request, exiting");
            return Ok(());
        }
        server.run()
    }

    fn call(&mut self, args: &[String]) -> anyhow::Result<()> {
        let args = CallArgs::parse_from(args);
        let reply: NameReply = rpc::call(&args.socket, &NameRequest { name: args.name })?;
        println!("{}", reply.len);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Dispatcher, Outcome};

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_registry_layout() {
        let registry = build_registry(&Config::default()).unwrap();
        assert_eq!(
            registry.help_listing(),
            "cl => Call\nec => Echo\nhello => Hello\nhelp => Help\nrn => Run\n\
             sv => Serve\nsymlinkops => SymlinkOPs\nsz => Size\nversion"
        );
    }

    #[test]
    fn test_hello_counts_greetings() {
        let registry = build_registry(&Config::default()).unwrap();
        let mut dispatcher = Dispatcher::with_output(registry, Vec::new());

        assert_eq!(
            dispatcher.run_cmd(argv(&["mcall", "hello", "there"])).unwrap(),
            Outcome::Dispatched
        );
        assert_eq!(
            dispatcher.run_cmd(argv(&["mcall.hello"])).unwrap(),
            Outcome::Dispatched
        );
        assert_eq!(dispatcher.registry().receiver().greetings(), 2);
    }

    #[test]
    fn test_run_failure_is_reported() {
        let registry = build_registry(&Config::default()).unwrap();
        let mut dispatcher = Dispatcher::with_output(registry, Vec::new());

        let err = dispatcher
            .run_cmd(argv(&["mcall", "rn", "--silent", "false"]))
            .unwrap_err();
        assert!(err.to_string().contains("command rn failed"));
    }

    #[test]
    fn test_name_length_handler() {
        let reply = NameLength.handle(NameRequest {
            name: "héllo".to_string(),
        });
        assert_eq!(reply, NameReply { len: 5 });
    }
}
