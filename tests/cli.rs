use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ALIPAY_CSV: &str = "\
支付宝交易记录明细查询
账号:[user@example.com]
交易号,商家订单号,交易创建时间,交易对方,商品名称,金额（元）,收/支,交易状态
A1,M1,2024-01-01 12:30:45,星巴克,拿铁,32.00,支出,交易成功
A2,M2,2024-01-02 09:00:00,滴滴出行,快车,18.50,支出,交易成功
A3,M3,2024-01-03 10:00:00,淘宝,退款订单,20.00,支出,交易关闭
";

fn paytrail(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("paytrail").unwrap();
    cmd.env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn write_export(home: &TempDir, name: &str, contents: &str) -> String {
    let path = home.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_preview_prints_csv() {
    let home = TempDir::new().unwrap();
    let file = write_export(&home, "alipay.csv", ALIPAY_CSV);
    paytrail(&home)
        .args(["preview", &file])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("date,time,direction,amount"))
        .stdout(predicate::str::contains("2024-01-01,12:30:45,expense,32.00,拿铁,星巴克,alipay"))
        .stdout(predicate::str::contains("退款订单").not())
        .stderr(predicate::str::contains("2 transactions, 1 rows skipped"));
}

#[test]
fn test_init_then_import_twice() {
    let home = TempDir::new().unwrap();
    let data_dir = home.path().join("ledger");
    paytrail(&home)
        .args(["init", "--data-dir", &data_dir.to_string_lossy()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized paytrail"));
    assert!(data_dir.join("paytrail.db").exists());

    let file = write_export(&home, "alipay.csv", ALIPAY_CSV);
    paytrail(&home)
        .args(["import", &file])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 imported"));
    paytrail(&home)
        .args(["import", &file])
        .assert()
        .success()
        .stdout(predicate::str::contains("already been imported"));
}

#[test]
fn test_import_unrecognized_file_fails() {
    let home = TempDir::new().unwrap();
    let file = write_export(&home, "contacts.csv", "name,email\nbob,bob@example.com\n");
    paytrail(&home)
        .args(["import", &file])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not recognize file format"));
}

#[test]
fn test_categories_lists_defaults() {
    let home = TempDir::new().unwrap();
    paytrail(&home)
        .arg("categories")
        .assert()
        .success()
        .stdout(predicate::str::contains("餐饮"))
        .stdout(predicate::str::contains("其他"));
}
