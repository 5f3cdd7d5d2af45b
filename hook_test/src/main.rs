mod scenarios;
mod test_ctx;

use xsig_hook::{get_version, set_debug};

fn main() {
    set_debug(true);
    println!("{}", get_version());
    scenarios::run_all();
    println!("hook_test all scenarios passed");
}
