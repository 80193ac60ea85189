use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use wasm_bindgen::prelude::*;
use web_sys::console;

pub mod carousel;
pub mod countdown;
pub mod forms;
pub mod reveal;
pub mod task;

use carousel::Carousel;
use countdown::Countdown;
use forms::FormValidator;
use reveal::RevealTracker;
use task::SubmitTask;

/// 初始化函数 - 设置错误处理
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// 版本信息
#[wasm_bindgen]
pub fn version() -> String {
    "1.0.0".to_string()
}

/// 把浏览器时间戳（毫秒）转换为UTC时刻，异常值回退为纪元
fn ms_to_utc(now_ms: f64) -> DateTime<Utc> {
    match Utc.timestamp_millis_opt(now_ms as i64) {
        chrono::LocalResult::Single(dt) => dt,
        _ => utils_common::models::epoch(),
    }
}

//===== 轮播 部分 =====

/// 轮播JS接口 - 页面上的每个轮播构造一个实例，互不共享状态
#[wasm_bindgen]
pub struct CarouselJs {
    inner: Carousel,
}

#[wasm_bindgen]
impl CarouselJs {
    /// 按幻灯片数量创建轮播；空轮播拒绝构造
    #[wasm_bindgen(constructor)]
    pub fn new(len: usize) -> Result<CarouselJs, JsValue> {
        console_error_panic_hook::set_once();

        let inner = Carousel::new(len).map_err(|e| {
            console::log_1(&JsValue::from_str(&format!("创建轮播失败: {}", e)));
            JsValue::from_str(&e)
        })?;
        Ok(CarouselJs { inner })
    }

    /// 启用自动前进，间隔固定
    pub fn enable_auto_advance(&mut self, interval_ms: f64, now_ms: f64) {
        self.inner.enable_auto_advance(interval_ms, now_ms);
    }

    pub fn index(&self) -> usize {
        self.inner.index()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn next(&mut self) -> usize {
        self.inner.next()
    }

    pub fn prev(&mut self) -> usize {
        self.inner.prev()
    }

    pub fn go_to(&mut self, k: i32) -> usize {
        self.inner.go_to(k as i64)
    }

    /// 鼠标悬停时挂起自动前进
    pub fn suspend(&mut self) {
        self.inner.suspend();
    }

    /// 离开悬停后从完整周期重新计时
    pub fn resume(&mut self, now_ms: f64) {
        self.inner.resume(now_ms);
    }

    /// 由页面的节拍回调驱动；到期前进时返回新索引
    pub fn tick(&mut self, now_ms: f64) -> Option<usize> {
        self.inner.tick(now_ms)
    }
}

//===== 模拟提交 部分 =====

/// 模拟提交任务JS接口 - 订阅表单、请求表单、加载更多共用
#[wasm_bindgen]
pub struct SubmitTaskJs {
    inner: SubmitTask,
}

#[wasm_bindgen]
impl SubmitTaskJs {
    #[wasm_bindgen(constructor)]
    pub fn new(delay_ms: f64) -> SubmitTaskJs {
        SubmitTaskJs {
            inner: SubmitTask::new(delay_ms),
        }
    }

    /// 尝试启动提交；返回false表示已有未完成的提交，按钮应保持禁用
    pub fn try_start(&mut self, now_ms: f64) -> bool {
        self.inner.start(now_ms)
    }

    pub fn is_pending(&self) -> bool {
        self.inner.is_pending()
    }

    /// 轮询任务；完成时恰好返回一次true
    pub fn poll(&mut self, now_ms: f64) -> bool {
        self.inner.poll(now_ms)
    }
}

//===== 表单校验 部分 =====

/// 校验邮箱格式
#[wasm_bindgen]
pub fn validate_email(email: &str) -> bool {
    forms::is_valid_email(email)
}

/// 校验必填字段
#[wasm_bindgen]
pub fn validate_required(value: &str) -> bool {
    forms::is_filled(value)
}

/// 表单校验器JS接口 - 登记字段规则后整体校验
#[wasm_bindgen]
pub struct FormValidatorJs {
    inner: FormValidator,
}

#[wasm_bindgen]
impl FormValidatorJs {
    #[wasm_bindgen(constructor)]
    pub fn new() -> FormValidatorJs {
        FormValidatorJs {
            inner: FormValidator::new(),
        }
    }

    pub fn require(&mut self, name: &str) {
        self.inner.require(name);
    }

    pub fn email(&mut self, name: &str) {
        self.inner.email(name);
    }

    /// 校验字段名到值的映射，返回无效字段名数组
    pub fn validate(&self, values: JsValue) -> Result<JsValue, JsValue> {
        let values: HashMap<String, String> = serde_wasm_bindgen::from_value(values)
            .map_err(|e| JsValue::from_str(&format!("解析表单值失败: {}", e)))?;
        let invalid = self.inner.validate(&|name| values.get(name).cloned());
        serde_wasm_bindgen::to_value(&invalid)
            .map_err(|e| JsValue::from_str(&format!("序列化结果失败: {}", e)))
    }
}

impl Default for FormValidatorJs {
    fn default() -> Self {
        FormValidatorJs::new()
    }
}

//===== 倒计时 部分 =====

/// 倒计时JS接口
#[wasm_bindgen]
pub struct CountdownJs {
    inner: Countdown,
}

#[wasm_bindgen]
impl CountdownJs {
    /// 目标日期无法解析时按已开始处理，不报错
    #[wasm_bindgen(constructor)]
    pub fn new(target: &str) -> CountdownJs {
        CountdownJs {
            inner: Countdown::new(target),
        }
    }

    /// 计算剩余时间快照 {days, hours, minutes, seconds, expired}
    pub fn snapshot(&self, now_ms: f64) -> Result<JsValue, JsValue> {
        let snap = self.inner.snapshot(ms_to_utc(now_ms));
        serde_wasm_bindgen::to_value(&snap)
            .map_err(|e| JsValue::from_str(&format!("序列化结果失败: {}", e)))
    }
}

//===== 滚动显现 部分 =====

/// 滚动显现跟踪器JS接口
#[wasm_bindgen]
pub struct RevealTrackerJs {
    inner: RevealTracker,
}

#[wasm_bindgen]
impl RevealTrackerJs {
    #[wasm_bindgen(constructor)]
    pub fn new() -> RevealTrackerJs {
        RevealTrackerJs {
            inner: RevealTracker::new(),
        }
    }

    /// 首次显现返回true，页面据此播放动画并解除观察
    pub fn reveal(&mut self, element_id: &str) -> bool {
        self.inner.reveal(element_id)
    }

    pub fn is_revealed(&self, element_id: &str) -> bool {
        self.inner.is_revealed(element_id)
    }
}

impl Default for RevealTrackerJs {
    fn default() -> Self {
        RevealTrackerJs::new()
    }
}
