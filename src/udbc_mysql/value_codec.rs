use crate::udbc::value::Value;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use mysql_async::Value as MyValue;

pub fn from_mysql_value(v: &MyValue) -> Value {
    match v {
        MyValue::NULL => Value::Null,
        MyValue::Int(i) => Value::I64(*i),
        MyValue::UInt(u) => Value::U64(*u),
        MyValue::Float(f) => Value::F64(*f as f64),
        MyValue::Double(d) => Value::F64(*d),
        MyValue::Bytes(b) => Value::Bytes(b.clone()),
        MyValue::Date(y, m, d, h, min, s, micro) => {
            let Some(date) = NaiveDate::from_ymd_opt(*y as i32, *m as u32, *d as u32) else {
                // 零日期（0000-00-00）等无法表示的值保留原文
                return Value::Str(format!(
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                    y, m, d, h, min, s
                ));
            };
            if *h == 0 && *min == 0 && *s == 0 && *micro == 0 {
                Value::Date(date)
            } else {
                date.and_hms_micro_opt(*h as u32, *min as u32, *s as u32, *micro)
                    .map(Value::DateTime)
                    .unwrap_or(Value::Date(date))
            }
        }
        MyValue::Time(is_neg, days, h, min, s, micro) => {
            let total_h = *days * 24 + (*h as u32);
            match NaiveTime::from_hms_micro_opt(total_h, *min as u32, *s as u32, *micro) {
                Some(t) if !*is_neg => Value::Time(t),
                // TIME 列可以是负值或超过 24 小时
                _ => Value::Str(format!(
                    "{}{:02}:{:02}:{:02}",
                    if *is_neg { "-" } else { "" },
                    total_h,
                    min,
                    s
                )),
            }
        }
    }
}

fn date_value(date: NaiveDate, time: NaiveTime) -> MyValue {
    MyValue::Date(
        date.year() as u16,
        date.month() as u8,
        date.day() as u8,
        time.hour() as u8,
        time.minute() as u8,
        time.second() as u8,
        time.nanosecond() / 1000,
    )
}

pub fn to_mysql_value(v: &Value) -> MyValue {
    match v {
        Value::Null => MyValue::NULL,
        Value::Bool(b) => MyValue::Int(if *b { 1 } else { 0 }),
        Value::I16(i) => MyValue::Int(*i as i64),
        Value::I32(i) => MyValue::Int(*i as i64),
        Value::I64(i) => MyValue::Int(*i),
        Value::U8(u) => MyValue::UInt(*u as u64),
        Value::U64(u) => MyValue::UInt(*u),
        Value::F64(f) => MyValue::Double(*f),
        Value::Str(s) => MyValue::Bytes(s.clone().into_bytes()),
        Value::Bytes(b) => MyValue::Bytes(b.clone()),
        Value::Date(d) => date_value(*d, NaiveTime::MIN),
        Value::Time(t) => MyValue::Time(
            false,
            0u32,
            t.hour() as u8,
            t.minute() as u8,
            t.second() as u8,
            t.nanosecond() / 1000,
        ),
        Value::DateTime(dt) => date_value(dt.date(), dt.time()),
        Value::DateTimeUtc(dt) => {
            let ndt = dt.naive_utc();
            date_value(ndt.date(), ndt.time())
        }
        Value::Decimal(d) => MyValue::Bytes(d.to_string().into_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_without_time_is_date() {
        let v = from_mysql_value(&MyValue::Date(2024, 2, 29, 0, 0, 0, 0));
        assert_eq!(v, Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
    }

    #[test]
    fn test_zero_date_does_not_panic() {
        let v = from_mysql_value(&MyValue::Date(0, 0, 0, 0, 0, 0, 0));
        assert_eq!(v, Value::Str("0000-00-00 00:00:00".into()));
    }

    #[test]
    fn test_negative_time() {
        let v = from_mysql_value(&MyValue::Time(true, 1, 2, 3, 4, 0));
        assert_eq!(v, Value::Str("-26:03:04".into()));
    }

    #[test]
    fn test_datetime_to_mysql() {
        let dt = NaiveDate::from_ymd_opt(2023, 5, 6)
            .unwrap()
            .and_hms_micro_opt(7, 8, 9, 10)
            .unwrap();
        assert_eq!(
            to_mysql_value(&Value::DateTime(dt)),
            MyValue::Date(2023, 5, 6, 7, 8, 9, 10)
        );
    }
}
